//! Integration tests for rendered registration files

use std::path::Path;

use reflectgen_builder::{BuildContext, Builder};
use reflectgen_codegen::{GeneratorConfig, render_file};
use reflectgen_foundation::DiagnosticCode;
use reflectgen_source::{SyntheticSource, parse_source};

const SHAPES_H: &str = r#"#pragma once
namespace gfx {
TCLASS(Icon="shape.png")
class Shape {
    TRTTI_ENABLE()
public:
    TFUNCTION()
    float area() const;
    TFUNCTION()
    void scale(float f);
    TFUNCTION()
    void scale(float x, float y);
};
TCLASS()
class Circle : public Shape {
    TRTTI_ENABLE(Shape)
public:
    Circle(float radius = 1.0f);
    TPROPERTY(RTTRFuncName="radius")
    float getRadius() const;
    TPROPERTY(RTTRFuncName="radius")
    void setRadius(float r);
};
TENUM()
enum class Fill { Solid, Hatched };
TPROPERTY()
int shapeCount;
}
"#;

fn render(header: &str) -> (String, Vec<DiagnosticCode>) {
    let mut ctx = BuildContext::default();
    let path = Path::new("/proj/include/gfx/Shapes.h");
    let source = SyntheticSource::from_parsed(path, parse_source(path, header));
    Builder::new(&mut ctx).build(&source);
    let mut codes: Vec<_> = ctx.diagnostics().iter().map(|d| d.code).collect();

    let ids = &ctx.source_files()[path];
    let config = GeneratorConfig::new().with_include_paths(["/proj/include"]);
    let rendered = render_file(ctx.tree(), path, ids, &config).unwrap();
    assert_eq!(rendered.name, "Shapes.generated.cpp");
    codes.extend(rendered.errors.iter().map(reflectgen_foundation::Error::code));
    (rendered.text, codes)
}

#[test]
fn renders_a_reflected_header() {
    let (text, codes) = render(SHAPES_H);
    assert!(codes.is_empty(), "{codes:?}");

    assert!(text.contains("#include <rttr/registration>\n#include \"gfx/Shapes.h\"\n"));
    assert!(text.contains("RTTR_REGISTRATION\n{\n\tusing namespace rttr;\n"));
    assert_eq!(text.matches("using namespace gfx;").count(), 1);

    assert!(text.contains("registration::class_<gfx::Shape>(\"gfx::Shape\")"));
    assert!(text.contains(".method(\"area\", &gfx::Shape::area)"));
    assert!(text.contains(".method(\"scale\", select_overload<void(float)>(&gfx::Shape::scale))"));
    assert!(text.contains(
        ".method(\"scale\", select_overload<void(float, float)>(&gfx::Shape::scale))"
    ));
    assert!(text.contains("metadata(\"Icon\", \"shape.png\")"));

    assert!(text.contains("// ---- register class gfx::Circle (base classes: gfx::Shape)"));
    assert!(text.contains(
        ".property(\"radius\", select_overload<float() const>(&gfx::Circle::getRadius), select_overload<void(float)>(&gfx::Circle::setRadius))"
    ));
    assert!(text.contains("registration::enumeration<gfx::Fill>(\"gfx::Fill\")"));
    assert!(text.contains("value(\"Hatched\", gfx::Fill::Hatched)"));
    assert!(text.contains("registration::property(\"gfx::shapeCount\", &gfx::shapeCount)"));
    assert!(text.ends_with("}\n"));
}

#[test]
fn rejected_items_leave_the_rest_intact() {
    let header = SHAPES_H.replace(
        "    TPROPERTY(RTTRFuncName=\"radius\")\n    float getRadius() const;\n",
        "",
    );
    let (text, codes) = render(&header);
    assert_eq!(codes, vec![DiagnosticCode::InvalidPropertyFunctionCount]);
    assert!(!text.contains("\"radius\""));
    assert!(text.contains("registration::class_<gfx::Circle>(\"gfx::Circle\")"));
}
