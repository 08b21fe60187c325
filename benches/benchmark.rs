use criterion::{Criterion, criterion_group, criterion_main};
use mk2fit::likelihood::{Mk2Config, Mk2Model, RateMode, RootPrior};
use mk2fit::model::Tree;
use mk2fit::states::TipStateLoader;
use mk2fit::time::{NodeLabeler, TimeWindow, assign_times, insert_window_boundaries};
use std::hint::black_box;

const TREE_SIZES: &[(&str, usize)] = &[("n128", 7), ("n1024", 10), ("n8192", 13)];

/// Balanced tree with 2^depth tips and one state line per tip.
fn balanced_tip_state_text(depth: usize) -> String {
    let mut clades: Vec<String> = (0..1usize << depth).map(|i| format!("T{i}:1")).collect();
    while clades.len() > 1 {
        clades = clades
            .chunks(2)
            .map(|pair| format!("({},{}):1", pair[0], pair[1]))
            .collect();
    }

    let mut text = format!("{};\n", clades[0]);
    for i in 0..1usize << depth {
        // Mostly state 0 with runs of 1
        let state = usize::from(i % 7 < 2);
        text.push_str(&format!("T{i} {state}\n"));
    }
    text
}

fn load(text: &str) -> Tree {
    TipStateLoader::new().load_str(text).unwrap().unwrap().tree
}

fn loading(c: &mut Criterion) {
    for (name, depth) in TREE_SIZES {
        let text = balanced_tip_state_text(*depth);
        c.bench_function(&format!("load {name}"), |b| {
            b.iter(|| load(black_box(&text)));
        });
    }
}

fn likelihood(c: &mut Criterion) {
    for (name, depth) in TREE_SIZES {
        let tree = load(&balanced_tip_state_text(*depth));
        for prior in [RootPrior::Stationary, RootPrior::CondLike] {
            let model = Mk2Model::new(Mk2Config::new().with_root_prior(prior));
            c.bench_function(&format!("nll {name} {prior:?}"), |b| {
                b.iter(|| model.neg_log_likelihood(black_box(&[0.3, 1.2]), &tree).unwrap());
            });
        }
    }
}

fn windowed_likelihood(c: &mut Criterion) {
    for (name, depth) in TREE_SIZES {
        let mut tree = load(&balanced_tip_state_text(*depth));
        assign_times(&mut tree, 0.0).unwrap();
        let window = TimeWindow::new(2.5, 5.5);
        insert_window_boundaries(&mut tree, window, &mut NodeLabeler::default()).unwrap();

        let config = Mk2Config::new()
            .with_rate_mode(RateMode::Equal)
            .with_time_window(window);
        let model = Mk2Model::new(config);
        c.bench_function(&format!("windowed nll {name}"), |b| {
            b.iter(|| model.neg_log_likelihood(black_box(&[0.8]), &tree).unwrap());
        });
    }
}

criterion_group!(regression, likelihood, windowed_likelihood);
criterion_group! {
    name = reporting;
    config = Criterion::default().sample_size(10);
    targets = loading
}
criterion_main!(regression, reporting);
