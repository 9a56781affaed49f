use criterion::{black_box, criterion_group, criterion_main, Criterion};

use coopsol_formula::{evaluate, VariableMap};

fn bench_evaluate(c: &mut Criterion) {
    let mut vars = VariableMap::new();
    vars.insert("total_fatura".to_string(), 1432.17);
    vars.insert("iluminacao_publica".to_string(), 38.52);
    vars.insert("outros_valores".to_string(), 12.9);
    vars.insert("fatura_concessionaria".to_string(), 301.44);
    vars.insert("percentual_desconto".to_string(), 20.0);

    c.bench_function("evaluate/default_discount", |b| {
        b.iter(|| {
            evaluate(
                black_box(
                    "(total_fatura - iluminacao_publica - outros_valores) * (percentual_desconto / 100)",
                ),
                black_box(&vars),
            )
        })
    });

    c.bench_function("evaluate/nested_parens", |b| {
        b.iter(|| {
            evaluate(
                black_box("((total_fatura - (iluminacao_publica + outros_valores)) * 0.2) / (1 + 0.05)"),
                black_box(&vars),
            )
        })
    });
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
