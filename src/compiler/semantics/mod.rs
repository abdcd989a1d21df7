/*
 * Semantic analysis of the syntax tree:
 * 1. Symbol table construction mirroring the program's lexical structure.
 * 2. Relocation of out-of-line impl tables into their owning structs, and
 *    the inheritance/dependency graphs that relocation makes checkable.
 * 3. Cycle detection over both graphs.
 * 4. Type propagation, name and overload resolution, and the classified
 *    diagnostic stream.
 */
pub mod checker;
pub mod cycles;
pub mod relocate;
pub mod scope_builder;
pub mod symbol_table;
mod tests;
pub mod types;
