//! The standard prelude: a handful of `extern fn` headers prepended to
//! every compiled file unless `--nostd` is given (spec §4.H, grounded in
//! `original_source/src/frontend/irgenerator.cpp`'s `add_std_prelude()`,
//! which declares exactly these two externs).

pub const SOURCE: &str = "extern fn print(void* s)\nextern fn scan(void* s, usize n)\n";
