//! Container record types.

mod array;
mod list;
mod map;
mod obj_array;

pub use array::{ArrayC, ArrayD, ArrayF, ArrayI, ArrayL, ArrayL64, ArrayS};
pub use list::{List, ListEntry};
pub use map::Map;
pub use obj_array::ObjArray;

use crate::registry::TypeRegistry;

pub(crate) fn register(reg: &TypeRegistry) {
    reg.register_default::<ArrayC>();
    reg.register_default::<ArrayS>();
    reg.register_default::<ArrayI>();
    reg.register_default::<ArrayL>();
    reg.register_default::<ArrayL64>();
    reg.register_default::<ArrayF>();
    reg.register_default::<ArrayD>();
    reg.register_default::<List>();
    reg.register_default::<ObjArray>();
    reg.register_default::<Map>();
}
