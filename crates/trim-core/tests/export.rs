mod common;

use trim_cad::CsgKernel;
use trim_core::{
    TrimConfig, export_exchange, export_stl, load_curve_network, load_primitives, trim_object,
};

#[test]
fn test_files_to_stl_and_exchange() {
    let dir = tempfile::tempdir().unwrap();
    let surfaces = dir.path().join("surface_info.json");
    let curves = dir.path().join("topo.json");
    let config_path = dir.path().join("trim.ron");
    std::fs::write(&surfaces, common::primitives_json()).unwrap();
    std::fs::write(&curves, common::curves_json(common::curve_values())).unwrap();
    common::config().save(&config_path).unwrap();

    let network = load_curve_network(&curves).unwrap();
    let primitives = load_primitives(&surfaces).unwrap();
    let config = TrimConfig::load(&config_path).unwrap();
    assert_eq!(network.len(), 14);
    assert_eq!(primitives.len(), 7);

    let kernel = CsgKernel::new();
    let model = trim_object(&network, &primitives, &config, &kernel).unwrap();

    let stl_path = dir.path().join("trimmed.stl");
    let triangles = export_stl(&kernel, &model.compound, config.stl_tolerance, &stl_path).unwrap();
    // Cube faces plus the two bore cylinders
    assert!(triangles > 48);

    let mut file = std::fs::File::open(&stl_path).unwrap();
    let mesh = stl_io::read_stl(&mut file).unwrap();
    assert_eq!(mesh.faces.len(), triangles);

    let exchange_path = dir.path().join("trimmed.step.ron");
    export_exchange(&kernel, &model.compound, &exchange_path).unwrap();
    let document = CsgKernel::read_exchange(&exchange_path).unwrap();
    assert_eq!(document.root, kernel.node(&model.compound).unwrap());
    assert_eq!(document.root.constituent_count(), 2);
}
