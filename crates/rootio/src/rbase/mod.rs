//! Base record types: object identity, names, strings and references.

mod named;
mod obj_string;
mod object;
mod process_id;
mod reference;
mod uuid;

pub use named::Named;
pub use obj_string::ObjString;
pub use object::{Object, HAS_UUID, IS_ON_HEAP, IS_REFERENCED, NOT_DELETED};
pub use process_id::ProcessId;
pub use reference::Ref;
pub use uuid::Uuid;

use crate::registry::TypeRegistry;

pub(crate) fn register(reg: &TypeRegistry) {
    reg.register_default::<Object>();
    reg.register_default::<Named>();
    reg.register_default::<ObjString>();
    reg.register_default::<Uuid>();
    reg.register_default::<ProcessId>();
    reg.register_default::<Ref>();
}
