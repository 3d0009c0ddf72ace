//! The blit shader must parse and validate before a device ever sees it.

use coinswarm::gpu::BLIT_SHADER;

fn validate_wgsl(source: &str) -> Result<naga::Module, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| format!("WGSL parse error: {:?}", e))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(module)
}

#[test]
fn test_blit_shader_validates() {
    validate_wgsl(BLIT_SHADER).expect("blit shader should be valid");
}

#[test]
fn test_blit_shader_entry_points() {
    let module = validate_wgsl(BLIT_SHADER).unwrap();
    let names: Vec<&str> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
    assert!(names.contains(&"vs_main"));
    assert!(names.contains(&"fs_main"));
}
