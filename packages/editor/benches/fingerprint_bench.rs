use criterion::{black_box, criterion_group, criterion_main, Criterion};
use formsync_editor::{ChangeFingerprint, ElementKind, FormDocument, FormElement, ValidationRule};
use serde_json::json;

fn form_with(fields: usize) -> FormDocument {
    let mut doc = FormDocument::new("bench", "Benchmark form").with_description("Generated");
    for i in 0..fields {
        doc = doc.with_element(
            FormElement::new(format!("field-{}", i), ElementKind::Select, format!("Field {}", i))
                .with_property("options", json!(["one", "two", "three"]))
                .with_property("placeholder", json!("Pick one"))
                .with_rule(ValidationRule::Required)
                .with_style("width", "50%"),
        );
    }
    doc
}

fn fingerprint_small_form(c: &mut Criterion) {
    let doc = form_with(5);

    c.bench_function("fingerprint_small_form", |b| {
        b.iter(|| ChangeFingerprint::of(black_box(&doc)))
    });
}

fn fingerprint_large_form(c: &mut Criterion) {
    let doc = form_with(200);

    c.bench_function("fingerprint_large_form", |b| {
        b.iter(|| ChangeFingerprint::of(black_box(&doc)))
    });
}

criterion_group!(benches, fingerprint_small_form, fingerprint_large_form);
criterion_main!(benches);
