use super::*;

#[test]
fn test_absolute_joins_with_single_separator() {
    assert_eq!(absolute("/Robot", "speed"), "/Robot/speed");
    assert_eq!(absolute("", "speed"), "/speed");
    assert_eq!(absolute("/Robot", "Arm/angle"), "/Robot/Arm/angle");
}

#[test]
fn test_root_path_normalization() {
    assert_eq!(root_path(""), "");
    assert_eq!(root_path("Robot"), "/Robot");
    assert_eq!(root_path("/Robot"), "/Robot");
    assert_eq!(root_path("Robot/Arm"), "/Robot/Arm");
}

#[test]
fn test_relative_strips_back_to_key() {
    for (path, key) in [("", "a"), ("/X", "pos"), ("/Robot/Arm", "angle"), ("/ü", "ключ")] {
        let abs = absolute(path, key);
        assert_eq!(relative(&abs, prefix_len(path)), Some(key));
    }
}

#[test]
fn test_relative_out_of_range_is_none() {
    assert_eq!(relative("/a", 5), None);
    // cut inside a multi-byte char
    assert_eq!(relative("/ü", 2), None);
}

#[test]
fn test_first_segment() {
    assert_eq!(first_segment("speed"), ("speed", false));
    assert_eq!(first_segment("Arm/angle"), ("Arm", true));
    assert_eq!(first_segment("Arm/Wrist/angle"), ("Arm", true));
    assert_eq!(first_segment("Arm/"), ("Arm", true));
    assert_eq!(first_segment(""), ("", false));
}

#[test]
fn test_prefix() {
    assert_eq!(prefix("/X"), "/X/");
    assert_eq!(prefix(""), "/");
    assert_eq!(prefix_len("/X"), 3);
}

#[test]
fn test_child_drops_trailing_separators() {
    assert_eq!(child("/X", "Arm"), "/X/Arm");
    assert_eq!(child("/X", "Arm/"), "/X/Arm");
    assert_eq!(child("/X", ""), "/X");
    assert_eq!(child("", ""), "");
    assert_eq!(child("", "//"), "");
}
