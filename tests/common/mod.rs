pub fn run_pipeline(src: &str) -> silt::ir::Program {
    let ast = silt::parse(src).unwrap();
    let mut root = silt::lower(ast).unwrap();
    silt::type_check(&mut root).unwrap();
    silt::generate(&root)
}
