pub mod ceisa;
pub mod declaration;
