use approx::assert_relative_eq;
use mk2fit::model::{BranchLength, Tree};
use mk2fit::newick::parse_str;
use mk2fit::time::{
    NodeLabeler, TimeDirection, TimeError, TimeWindow, assign_lengths, assign_times,
    insert_time_slice, insert_window_boundaries, tip_distances,
};

/// ((A:1,B:1):1,C:2) with times root=0, AB=1, tips=2
fn timed_tree() -> Tree {
    let mut tree = parse_str("((A:1,B:1):1,C:2);").unwrap();
    assign_times(&mut tree, 0.0).unwrap();
    tree
}

fn time_of(tree: &Tree, label: &str) -> Option<f64> {
    tree.pre_order_iter()
        .find(|v| v.label() == Some(label))
        .and_then(|v| v.time())
}

// --- TESTS TIMES AND LENGTHS ---
#[test]
fn test_assign_times() {
    let mut tree = parse_str("((A:1,B:0.5)AB:1.5,C:2)root;").unwrap();
    assign_times(&mut tree, 10.0).unwrap();

    assert_eq!(time_of(&tree, "root"), Some(10.0));
    assert_eq!(time_of(&tree, "AB"), Some(11.5));
    assert_eq!(time_of(&tree, "A"), Some(12.5));
    assert_eq!(time_of(&tree, "B"), Some(12.0));
    assert_eq!(time_of(&tree, "C"), Some(12.0));
    assert!(tree.vertices_have_times());
}

#[test]
fn test_assign_times_needs_lengths() {
    let mut tree = parse_str("(A,B:1);").unwrap();
    let a = tree.find_tip("A").unwrap();
    assert_eq!(
        assign_times(&mut tree, 0.0),
        Err(TimeError::MissingBranchLength { vertex: a })
    );
}

#[test]
fn test_assign_lengths_forward() {
    let mut tree = parse_str("((A:1,B:0.5):1.5,C:2):3;").unwrap();
    let before: Vec<_> = tree.vertices().iter().map(|v| v.branch_length()).collect();
    assign_times(&mut tree, 0.0).unwrap();
    for index in 0..tree.num_vertices() {
        tree[index].set_branch_length(None);
    }

    assign_lengths(&mut tree, TimeDirection::Forward).unwrap();
    let after: Vec<_> = tree.vertices().iter().map(|v| v.branch_length()).collect();

    // The root's own length is reset to zero
    assert_eq!(after[0], Some(BranchLength::ZERO));
    assert_eq!(after[1..], before[1..]);
}

#[test]
fn test_assign_lengths_backward() {
    // Ages before present: the root is oldest
    let mut tree = parse_str("((A,B)AB,C);").unwrap();
    for (label, age) in [("AB", 3.0), ("A", 0.5), ("B", 0.0), ("C", 1.0)] {
        let index = tree
            .pre_order_iter()
            .find(|v| v.label() == Some(label))
            .map(|v| v.index())
            .unwrap();
        tree[index].set_time(Some(age));
    }
    let root = tree.root().index();
    tree[root].set_time(Some(5.0));

    assign_lengths(&mut tree, TimeDirection::Backward).unwrap();
    let length_of = |label: &str| {
        tree.pre_order_iter()
            .find(|v| v.label() == Some(label))
            .and_then(|v| v.branch_length())
            .map(|l| *l)
    };
    assert_eq!(length_of("AB"), Some(2.0));
    assert_eq!(length_of("A"), Some(2.5));
    assert_eq!(length_of("B"), Some(3.0));
    assert_eq!(length_of("C"), Some(4.0));
}

#[test]
fn test_assign_lengths_wrong_direction() {
    let mut tree = timed_tree();
    assert!(matches!(
        assign_lengths(&mut tree, TimeDirection::Backward),
        Err(TimeError::NegativeBranchLength { .. })
    ));
}

#[test]
fn test_assign_lengths_needs_times() {
    let mut tree = parse_str("(A:1,B:1);").unwrap();
    assert!(matches!(
        assign_lengths(&mut tree, TimeDirection::Forward),
        Err(TimeError::MissingTime { .. })
    ));
}

#[test]
fn test_tip_distances() {
    let tree = parse_str("((A:1,B:2):1,(C:0.5):0.25):7;").unwrap();
    assert_eq!(tip_distances(&tree), Ok(vec![2.0, 3.0, 0.75]));
}

// --- TESTS TIME SLICES ---
#[test]
fn test_insert_time_slice() {
    let mut tree = timed_tree();
    let mut labeler = NodeLabeler::default();
    let inserted = insert_time_slice(&mut tree, 0.5, &mut labeler).unwrap();

    // Branches to AB and C span 0.5
    assert_eq!(inserted.len(), 2);
    assert_eq!(tree.num_vertices(), 7);
    assert!(tree.is_valid());
    assert_eq!(tree.root().children(), inserted.as_slice());

    let labels: Vec<_> = inserted.iter().map(|&i| tree[i].label()).collect();
    assert_eq!(labels, vec![Some("n1"), Some("n2")]);

    for &index in &inserted {
        let vertex = &tree[index];
        assert_eq!(vertex.time(), Some(0.5));
        assert_eq!(vertex.children().len(), 1);
        assert_eq!(vertex.branch_length(), Some(BranchLength::new(0.5)));
    }

    // Split branches were shortened, distances unchanged
    let c = tree.find_tip("C").unwrap();
    assert_eq!(tree[c].branch_length(), Some(BranchLength::new(1.5)));
    assert_eq!(tip_distances(&tree), Ok(vec![2.0, 2.0, 2.0]));
}

#[test]
fn test_insert_time_slice_labels_continue() {
    let mut tree = timed_tree();
    let mut labeler = NodeLabeler::new("slice");
    insert_time_slice(&mut tree, 0.5, &mut labeler).unwrap();
    let inserted = insert_time_slice(&mut tree, 1.5, &mut labeler).unwrap();

    let labels: Vec<_> = inserted.iter().map(|&i| tree[i].label()).collect();
    assert_eq!(labels, vec![Some("slice3"), Some("slice4"), Some("slice5")]);
    assert!(tree.is_valid());
}

#[test]
fn test_insert_time_slice_at_vertex_time() {
    // AB sits exactly at time 1: only the branch to C spans it
    let mut tree = timed_tree();
    let inserted = insert_time_slice(&mut tree, 1.0, &mut NodeLabeler::default()).unwrap();
    assert_eq!(inserted.len(), 1);
    assert_eq!(tree[tree[inserted[0]].children()[0]].label(), Some("C"));

    for vertex in tree.vertices() {
        if !vertex.is_root() {
            assert!(*vertex.branch_length().unwrap() > 0.0);
        }
    }
}

#[test]
fn test_insert_time_slice_near_vertex_time() {
    let epsilon = 1e-9;

    // Just above: branches to A, B and C
    let mut above = timed_tree();
    let inserted = insert_time_slice(&mut above, 1.0 + epsilon, &mut NodeLabeler::default()).unwrap();
    assert_eq!(inserted.len(), 3);

    // Just below: branches to AB and C
    let mut below = timed_tree();
    let inserted = insert_time_slice(&mut below, 1.0 - epsilon, &mut NodeLabeler::default()).unwrap();
    assert_eq!(inserted.len(), 2);

    for tree in [&above, &below] {
        for vertex in tree.vertices().iter().filter(|v| !v.is_root()) {
            let length = *vertex.branch_length().unwrap();
            assert!(length > 0.0);
        }
    }
}

#[test]
fn test_insert_time_slice_outside_tree() {
    let mut tree = timed_tree();
    let mut labeler = NodeLabeler::default();
    assert!(insert_time_slice(&mut tree, -1.0, &mut labeler).unwrap().is_empty());
    assert!(insert_time_slice(&mut tree, 2.0, &mut labeler).unwrap().is_empty());
    assert_eq!(tree.num_vertices(), 5);
    assert_eq!(labeler.count(), 0);
}

#[test]
fn test_insert_time_slice_needs_times() {
    let mut tree = parse_str("((A:1,B:1):1,C:2);").unwrap();
    let result = insert_time_slice(&mut tree, 0.5, &mut NodeLabeler::default());
    assert!(matches!(result, Err(TimeError::MissingTime { .. })));
    assert_eq!(tree.num_vertices(), 5);
}

#[test]
fn test_insert_time_slice_rejects_vertex_older_than_parent() {
    // Root at 0, X at 2, Y below X at 1, Z at 3
    let mut tree = Tree::new();
    let y = tree.add_tip(Some("Y"), None, None);
    let x = tree.add_internal(vec![y], Some("X"), None);
    let z = tree.add_tip(Some("Z"), None, None);
    let root = tree.add_root(vec![x, z], None);
    for (index, time) in [(root, 0.0), (x, 2.0), (y, 1.0), (z, 3.0)] {
        tree[index].set_time(Some(time));
    }
    let lengths: Vec<_> = tree.vertices().iter().map(|v| v.branch_length()).collect();

    let mut labeler = NodeLabeler::default();
    let result = insert_time_slice(&mut tree, 0.5, &mut labeler);
    assert_eq!(
        result,
        Err(TimeError::NegativeBranchLength { vertex: y, length: -1.0 })
    );

    // Nothing was inserted or recomputed
    assert_eq!(tree.num_vertices(), 4);
    assert_eq!(labeler.count(), 0);
    let after: Vec<_> = tree.vertices().iter().map(|v| v.branch_length()).collect();
    assert_eq!(after, lengths);
    assert_eq!(tree.root().children(), &[x, z]);
}

#[test]
fn test_insert_window_boundaries() {
    let mut tree = timed_tree();
    let window = TimeWindow::new(0.5, 1.5);
    let inserted = insert_window_boundaries(&mut tree, window, &mut NodeLabeler::default()).unwrap();
    assert_eq!(inserted.len(), 5);
    assert_eq!(tree.num_vertices(), 10);
    assert!(tree.is_valid());
    assert_eq!(tip_distances(&tree), Ok(vec![2.0, 2.0, 2.0]));
}

// --- TESTS WINDOWS ---
#[test]
fn test_schedule_works_back_from_tips() {
    let windows = TimeWindow::schedule(1.0, 3.0, 0.75);
    assert_eq!(
        windows,
        vec![
            TimeWindow::new(2.25, 3.0),
            TimeWindow::new(1.5, 2.25),
            TimeWindow::new(1.0, 1.5),
        ]
    );
}

#[test]
fn test_schedule_covers_tree() {
    let tree = timed_tree();
    let root_time = tree.root().time().unwrap();
    let tip_time = root_time + tree.age(mk2fit::model::AgeMode::General).unwrap();
    let windows = TimeWindow::schedule(root_time, tip_time, 0.25);

    assert_eq!(windows.len(), 8);
    assert_eq!(windows.first().unwrap().end, tip_time);
    assert_eq!(windows.last().unwrap().start, root_time);
    for pair in windows.windows(2) {
        assert_eq!(pair[0].start, pair[1].end);
    }
    let covered: f64 = windows.iter().map(|w| w.end - w.start).sum();
    assert_relative_eq!(covered, tip_time - root_time, epsilon = 1e-12);
}
