pub mod explodes;
pub mod remark;
pub mod subparser;

pub use explodes::explode;
pub use remark::{clean_name, normalize_name, BatchContext, NameStrictness, UNNAMED};
pub use subparser::{parse_node_file, parse_node_list};
