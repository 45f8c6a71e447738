use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use scanwise_tui::app::{App, ScanHooks};
use scanwise_tui::engine::GenerativeEngine;
use scanwise_tui::schema::repair::parse_partial_json;
use scanwise_tui::schema::{AnalysisResult, RiskItem, RiskSeverity, UserProfile, Variant};
use scanwise_tui::session::{StreamEvent, StreamMessage};
use scanwise_tui::stream::demo;
use scanwise_tui::ui::{self, leaf::RenderContext, tree::render_tree};
use std::time::Instant;

fn synthetic_risk(item_count: usize) -> AnalysisResult {
    AnalysisResult::Risk {
        headline: "Several ingredients need a closer look".to_string(),
        risk_hierarchy: (0..item_count)
            .map(|i| RiskItem {
                ingredient: format!("Ingredient {i:03}"),
                severity: if i % 2 == 0 {
                    RiskSeverity::High
                } else {
                    RiskSeverity::Med
                },
                reason: format!("Reason {i} explained over a couple of wrapped lines of text"),
            })
            .collect(),
    }
}

fn bench_engine_generate(c: &mut Criterion) {
    let engine = GenerativeEngine::default();
    let result = synthetic_risk(200);
    c.bench_function("engine_generate_risk_200", |b| {
        b.iter(|| black_box(engine.generate(black_box(&result), UserProfile::Diabetic)));
    });
}

fn bench_partial_repair(c: &mut Criterion) {
    let document = demo::document(Variant::Risk, UserProfile::Vegan);
    let cuts: Vec<usize> = document
        .char_indices()
        .map(|(offset, _)| offset)
        .step_by(12)
        .collect();

    c.bench_function("repair_every_prefix_demo_risk", |b| {
        b.iter(|| {
            for &cut in &cuts {
                black_box(parse_partial_json(black_box(&document[..cut])));
            }
        });
    });
}

fn bench_render_tree(c: &mut Criterion) {
    let tree = GenerativeEngine::default().generate(&synthetic_risk(200), UserProfile::Paleo);
    let ctx = RenderContext::default();
    c.bench_function("render_tree_risk_200", |b| {
        b.iter(|| black_box(render_tree(black_box(&tree), &ctx).flatten().len()));
    });
}

fn bench_render_frame(c: &mut Criterion) {
    let mut app = App::new(UserProfile::Diabetic, ScanHooks::default());
    let (scan, _) = app.start_scan(Instant::now());
    let value = serde_json::to_value(synthetic_risk(40)).expect("serializable");
    app.handle_stream(StreamMessage {
        scan,
        event: StreamEvent::Snapshot { seq: 1, value },
    });

    let backend = TestBackend::new(140, 42);
    let mut terminal = Terminal::new(backend).expect("terminal should initialize");

    c.bench_function("render_frame_streaming_risk", |b| {
        b.iter(|| {
            terminal
                .draw(|frame| ui::render(frame, &mut app))
                .expect("draw should succeed");
        });
    });
}

criterion_group!(
    perf_core,
    bench_engine_generate,
    bench_partial_repair,
    bench_render_tree,
    bench_render_frame
);
criterion_main!(perf_core);
