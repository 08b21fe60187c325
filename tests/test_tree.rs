use mk2fit::model::{AgeMode, BranchLength, CharacterState, Tree, VertexKind};
use mk2fit::newick::parse_str;
use mk2fit::time::TimeError;

/// ((A:1,B:1):1.5,C:0.5) with states A=0, B=1, C=1
fn small_tree() -> Tree {
    let mut tree = Tree::new();
    let a = tree.add_tip(Some("A"), Some(CharacterState::Discrete(0)), Some(BranchLength::new(1.0)));
    let b = tree.add_tip(Some("B"), Some(CharacterState::Discrete(1)), Some(BranchLength::new(1.0)));
    let c = tree.add_tip(Some("C"), Some(CharacterState::Discrete(1)), Some(BranchLength::new(0.5)));
    let ab = tree.add_internal(vec![a, b], None, Some(BranchLength::new(1.5)));
    tree.add_root(vec![ab, c], Some("root"));
    tree
}

// --- TESTS CONSTRUCTION ---
#[test]
fn test_building_tree() {
    let tree = small_tree();

    // Counts
    assert_eq!(tree.num_tips(), 3);
    assert_eq!(tree.num_internal(), 2);
    assert_eq!(tree.num_vertices(), 5);
    assert!(tree.is_valid());

    // Root
    let root = tree.root();
    assert_eq!(root.index(), 4);
    assert!(root.is_root());
    assert_eq!(root.label(), Some("root"));
    assert_eq!(root.branch_length(), Some(BranchLength::ZERO));

    // Tip
    let b = &tree[1];
    assert!(b.is_tip());
    assert_eq!(b.parent(), Some(3));
    assert_eq!(b.state(), Some(CharacterState::Discrete(1)));
    assert_eq!(b.children(), &[] as &[usize]);

    // Internal
    let ab = &tree[3];
    assert!(ab.is_internal());
    assert_eq!(ab.state(), None);
    assert!(matches!(ab.kind(), VertexKind::Internal { children } if children == &vec![0, 1]));
}

#[test]
fn test_add_child_derives_length_from_times() {
    let mut tree = Tree::new();
    let root = tree.add_tip(Some("root"), None, None);
    tree[root].set_time(Some(2.0));
    tree.set_root(root);

    // Both times known: length derived, supplied length ignored
    let derived = tree.add_child(root, Some("A"), Some(3.5), Some(BranchLength::new(9.0)));
    // Child time unknown: supplied length kept
    let supplied = tree.add_child(root, Some("B"), None, Some(BranchLength::new(0.7)));
    // Negative difference: supplied length kept
    let negative = tree.add_child(root, Some("C"), Some(1.0), Some(BranchLength::new(0.2)));

    assert!(tree.root().is_internal());
    assert_eq!(tree[derived].branch_length(), Some(BranchLength::new(1.5)));
    assert_eq!(tree[supplied].branch_length(), Some(BranchLength::new(0.7)));
    assert_eq!(tree[negative].branch_length(), Some(BranchLength::new(0.2)));
    assert_eq!(tree.root().children(), &[derived, supplied, negative]);
    assert!(tree.is_valid());
}

#[test]
#[should_panic]
fn test_add_child_to_tip_with_state_panics() {
    let mut tree = small_tree();
    tree.add_child(0, Some("D"), None, None);
}

#[test]
#[should_panic]
fn test_add_internal_without_children_panics() {
    let mut tree = Tree::new();
    tree.add_internal(vec![], None, None);
}

#[test]
#[should_panic]
fn test_get_root_panics_on_empty_tree() {
    let tree = Tree::new();
    tree.root();
}

#[test]
#[should_panic]
fn test_negative_branch_length_panics() {
    BranchLength::new(-0.1);
}

#[test]
fn test_try_new_branch_length() {
    assert_eq!(BranchLength::try_new(0.0), Some(BranchLength::ZERO));
    assert_eq!(BranchLength::try_new(-1.0), None);
    assert_eq!(BranchLength::try_new(f64::NAN), None);
    assert_eq!(BranchLength::try_new(f64::INFINITY), None);
}

#[test]
fn test_subtree() {
    let tree = small_tree();
    let subtree = tree.subtree(3);

    assert_eq!(subtree.num_vertices(), 3);
    assert!(subtree.is_valid());
    assert_eq!(subtree.root().branch_length(), Some(BranchLength::new(1.5)));
    assert_eq!(
        subtree.tip_states(),
        vec![
            (Some("A"), Some(CharacterState::Discrete(0))),
            (Some("B"), Some(CharacterState::Discrete(1))),
        ]
    );
}

#[test]
fn test_root_set_and_vertex_access() {
    let mut tree = Tree::new();
    assert!(!tree.is_root_set());
    let a = tree.add_tip(Some("A"), None, Some(BranchLength::new(1.0)));
    let b = tree.add_tip(Some("B"), None, Some(BranchLength::new(1.0)));
    assert!(!tree.is_root_set());
    let root = tree.add_root(vec![a, b], None);
    assert!(tree.is_root_set());

    tree.vertex_mut(b).set_state(Some(CharacterState::Discrete(1)));
    tree.vertex_mut(root).set_label(Some("AB".to_string()));
    assert_eq!(tree.vertex(b).state(), Some(CharacterState::Discrete(1)));
    assert_eq!(tree.root().label(), Some("AB"));
}

// --- TESTS QUERIES ---
#[test]
fn test_tip_states_in_order() {
    let tree = small_tree();
    assert_eq!(
        tree.tip_states(),
        vec![
            (Some("A"), Some(CharacterState::Discrete(0))),
            (Some("B"), Some(CharacterState::Discrete(1))),
            (Some("C"), Some(CharacterState::Discrete(1))),
        ]
    );
}

#[test]
fn test_find_tip() {
    let tree = small_tree();
    assert_eq!(tree.find_tip("C"), Some(2));
    assert_eq!(tree.find_tip("root"), None);
    assert_eq!(tree.find_tip("Moa"), None);
}

#[test]
fn test_age_modes() {
    let tree = parse_str("((A:1,B:2):1,C:1);").unwrap();
    assert_eq!(tree.age(AgeMode::Ultrametric), Ok(2.0));
    assert_eq!(tree.age(AgeMode::General), Ok(3.0));

    let ultrametric = parse_str("((A:1,B:1):1,C:2);").unwrap();
    assert_eq!(
        ultrametric.age(AgeMode::Ultrametric),
        ultrametric.age(AgeMode::General)
    );
}

#[test]
fn test_age_needs_branch_lengths() {
    let tree = parse_str("((A,B):1,C:1);").unwrap();
    assert!(matches!(
        tree.age(AgeMode::Ultrametric),
        Err(TimeError::MissingBranchLength { .. })
    ));
    assert_eq!(Tree::new().age(AgeMode::General), Err(TimeError::EmptyTree));
}

// --- TESTS TRAVERSAL ---
#[test]
fn test_post_order() {
    let tree = small_tree();
    let order: Vec<usize> = tree.post_order_iter().map(|v| v.index()).collect();
    assert_eq!(order, vec![0, 1, 3, 2, 4]);
}

#[test]
fn test_pre_order() {
    let tree = small_tree();
    let order: Vec<usize> = tree.pre_order_iter().map(|v| v.index()).collect();
    assert_eq!(order, vec![4, 3, 0, 1, 2]);
}

#[test]
fn test_deep_tree_traversal() {
    // Caterpillar of depth 50_000, too deep for recursion
    let depth = 50_000;
    let mut tree = Tree::with_capacity(2 * depth + 1);
    let mut clade = tree.add_tip(Some("T0"), None, Some(BranchLength::new(1.0)));
    for i in 1..=depth {
        let tip = tree.add_tip(Some(&format!("T{i}")), None, Some(BranchLength::new(1.0)));
        clade = tree.add_internal(vec![clade, tip], None, Some(BranchLength::new(1.0)));
    }
    tree.set_root(clade);

    assert_eq!(tree.post_order_iter().count(), 2 * depth + 1);
    assert_eq!(tree.post_order_iter().last().map(|v| v.index()), Some(clade));
    assert!(tree.is_valid());
    assert_eq!(tree.age(AgeMode::General), Ok(depth as f64));
}

// --- TESTS VALIDITY / PRINTING ---
#[test]
fn test_invalid_without_root() {
    let mut tree = Tree::new();
    let a = tree.add_tip(Some("A"), None, None);
    let b = tree.add_tip(Some("B"), None, None);
    tree.add_internal(vec![a, b], None, None);
    assert!(!tree.is_valid());
}

#[test]
fn test_invalid_with_orphan() {
    let mut tree = small_tree();
    tree.add_tip(Some("Orphan"), None, None);
    assert!(!tree.is_valid());
}

#[test]
fn test_display() {
    let mut tree = Tree::new();
    let a = tree.add_tip(Some("A"), Some(CharacterState::Discrete(0)), Some(BranchLength::new(1.0)));
    let b = tree.add_tip(None, None, Some(BranchLength::new(1.0)));
    tree.add_root(vec![a, b], Some("root"));

    let expected = "Tree with 2 tips (3 vertices total):\n\
                    [2] root l=0.0000\n  \
                    ├─ [0] A l=1.0000 s=0\n  \
                    └─ [1] - l=1.0000\n";
    assert_eq!(tree.to_string(), expected);
}

#[test]
fn test_fixed_marker() {
    let mut tree = small_tree();
    assert!(tree.vertices().iter().all(|v| !v.is_fixed()));
    tree[2].set_fixed(true);
    assert!(tree[2].is_fixed());
    assert!(tree.is_valid());
}
