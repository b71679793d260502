//! Full runs from a rubric.toml and real headers.

use rubric_codegen::WriterMode;
use rubric_driver::Driver;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SHAPES_H: &str = r#"#ifndef SHAPES_H
#define SHAPES_H

namespace shapes {

class Shape {
public:
    virtual float area() = 0;
};

class Circle : public Shape {
public:
    Circle(float r);
    float area();
    float radius;
};

float total_area(Shape* a, Shape* b);

}

#endif
"#;

fn project(config: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("shapes.h"), SHAPES_H).unwrap();
    fs::write(dir.path().join("rubric.toml"), config).unwrap();
    dir
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_single_file_run() {
    let dir = project(
        r#"
[extension]
name = "shapes"
namespace = "shapes"
writer = "single"

[sources]
headers = ["shapes.h"]

[[function]]
name = "shapes::total_area"
rename = "sum_areas"
"#,
    );
    let driver = Driver::from_config_file(dir.path().join("rubric.toml")).unwrap();
    let written = driver.run().unwrap();

    assert_eq!(written, vec![dir.path().join("generated").join("shapes.rb.cpp")]);
    let text = read(&written[0]);
    let header = dir.path().join("shapes.h");

    assert!(text.starts_with("// This file generated by rubric"));
    assert!(text.contains(&format!("#include \"{}\"", header.display())));
    assert!(text.contains("class shapes_ShapeDirector : public shapes::Shape, public Rice::Director {"));
    assert!(text.contains("Rice::define_class< shapes::Circle, shapes::Shape >(\"Circle\")"));
    assert!(text.contains("Rice::Constructor< shapes::Circle, float >()"));
    assert!(text.contains("Rice::define_global_function(\"sum_areas\", &wrap_shapes_total_area);"));
    assert!(text.contains("void Init_shapes() {"));
}

#[test]
fn test_writer_and_output_overrides() {
    let dir = project(
        r#"
[extension]
name = "shapes"
namespace = "shapes"

[sources]
headers = ["shapes.h"]
"#,
    );
    let out = dir.path().join("out");
    let driver = Driver::from_config_file(dir.path().join("rubric.toml"))
        .unwrap()
        .with_output(&out);
    assert_eq!(driver.writer_mode(), WriterMode::Multiple);

    let written = driver.run().unwrap();
    assert!(written.len() > 1);
    assert!(written.iter().all(|p| p.starts_with(&out)));
    assert!(out.join("shapes.rb.cpp").exists());
    assert!(out.join("_shapes_Shape.rb.hpp").exists());

    let driver = driver.with_writer(WriterMode::Single);
    let files = driver.generate().unwrap();
    assert_eq!(files.len(), 1);
}

#[test]
fn test_failed_run_writes_nothing() {
    let dir = project(
        r#"
[extension]
name = "shapes"
namespace = "shapes"

[sources]
headers = ["shapes.h"]

[[class]]
name = "shapes::Circle"
superclass = "Square"
"#,
    );
    let driver = Driver::from_config_file(dir.path().join("rubric.toml")).unwrap();
    assert!(driver.run().is_err());
    assert!(!dir.path().join("generated").exists());
}

#[test]
fn test_missing_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(Driver::from_config_file(dir.path().join("rubric.toml")).is_err());
}
