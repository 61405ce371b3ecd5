use ndarray::array;

use crate::discretizer::StateDiscretizer;

#[test]
fn test_worked_example() {
    let disc = StateDiscretizer::new(vec![5], vec![10.0]).unwrap();

    // 3 * 5 / 10 - eps = 1.4999... -> bucket 1
    assert_eq!(disc.disc_indices(array![3.0].view()), vec![1]);
    // above range: 5 - eps -> bucket 4
    assert_eq!(disc.disc_indices(array![12.0].view()), vec![4]);
}

#[test]
fn test_range_boundary_is_not_clamped() {
    let disc = StateDiscretizer::new(vec![5], vec![10.0]).unwrap();

    // Exactly on the range goes through the scaling branch (strict >), and
    // the nudge keeps it in the top bucket.
    assert_eq!(disc.disc_indices(array![10.0].view()), vec![4]);
    // 1.5x the range clamps to the top bucket.
    assert_eq!(disc.disc_indices(array![15.0].view()), vec![4]);
}

#[test]
fn test_zero_observation_lands_in_bucket_zero() {
    let disc = StateDiscretizer::new(vec![5], vec![10.0]).unwrap();
    assert_eq!(disc.disc_indices(array![0.0].view()), vec![0]);
}

#[test]
fn test_deterministic() {
    let disc = StateDiscretizer::new(vec![4, 8], vec![1.0, 2.0]).unwrap();
    let obs = array![0.37, 1.21];
    let first = disc.disc_indices(obs.view());
    for _ in 0..10 {
        assert_eq!(disc.disc_indices(obs.view()), first);
    }
    assert_eq!(disc.index_of(obs.view()), disc.index_of(obs.view()));
}

#[test]
fn test_state_index_single_dimension() {
    let disc = StateDiscretizer::new(vec![7], vec![1.0]).unwrap();
    assert_eq!(disc.state_index(&[3]), 3);
}

#[test]
fn test_state_index_two_dimensions() {
    let disc = StateDiscretizer::new(vec![5, 4], vec![1.0, 1.0]).unwrap();
    // 2 + 3 * 5
    assert_eq!(disc.state_index(&[2, 3]), 17);
}

#[test]
fn test_state_index_three_dimensions() {
    let disc = StateDiscretizer::new(vec![3, 4, 5], vec![1.0, 1.0, 1.0]).unwrap();
    // 2 + 3*3 + 4*(3*4)
    assert_eq!(disc.state_index(&[2, 3, 4]), 59);
}

#[test]
fn test_index_of_composes_bucketing_and_encoding() {
    let disc = StateDiscretizer::new(vec![4, 4], vec![1.0, 1.0]).unwrap();
    // buckets: 0.3 -> 1, 0.8 -> 3; index = 1 + 3*4
    assert_eq!(disc.index_of(array![0.3, 0.8].view()), 13);
}

#[test]
fn test_space_size() {
    let disc = StateDiscretizer::new(vec![3, 4, 5], vec![1.0, 1.0, 1.0]).unwrap();
    assert_eq!(disc.space_size(), 60);
}

#[test]
fn test_construction_validation() {
    assert!(StateDiscretizer::new(vec![3, 4], vec![1.0]).is_err());
    assert!(StateDiscretizer::new(vec![], vec![]).is_err());
    assert!(StateDiscretizer::new(vec![0], vec![1.0]).is_err());
    assert!(StateDiscretizer::new(vec![3], vec![0.0]).is_err());
    assert!(StateDiscretizer::new(vec![3], vec![-1.0]).is_err());
}
