mod common;
use common::run_pipeline;

#[test]
#[should_panic]
fn fail_lexing() {
    run_pipeline("fn main(): u8 { return 1 $ 2; }");
}

#[test]
#[should_panic]
fn fail_parsing() {
    run_pipeline("fn main(): u8 { return 1 + ; }");
}

#[test]
#[should_panic]
fn fail_name_resolution() {
    run_pipeline("fn main(): u8 { return y; }");
}

#[test]
#[should_panic]
fn fail_redeclaration() {
    run_pipeline("fn main(): u8 { let x = 1; let x = 2; return x; }");
}

#[test]
#[should_panic]
fn fail_type_checking() {
    run_pipeline("fn main(): u8 { return 300; }");
}

#[test]
#[should_panic]
fn fail_truncating_call() {
    run_pipeline("fn f(let x: u8): u8 { return x; } fn main(): u8 { return f(1024); }");
}
