pub mod symbols;
pub mod types;

pub use symbols::SymbolTable;
pub use types::Type;
