use super::*;

#[test]
fn constructors_pick_the_right_variant() {
    assert!(matches!(
        EaselError::invalid_state("gone"),
        EaselError::InvalidState(_)
    ));
    assert!(matches!(
        EaselError::configuration("bad"),
        EaselError::Configuration(_)
    ));
    assert!(matches!(
        EaselError::resource_exhaustion("full"),
        EaselError::ResourceExhaustion(_)
    ));
}

#[test]
fn display_includes_the_message() {
    let err = EaselError::invalid_state("node 7 is destroyed");
    assert_eq!(err.to_string(), "invalid state: node 7 is destroyed");
    let err = EaselError::configuration("bad points list");
    assert_eq!(err.to_string(), "configuration error: bad points list");
}

#[test]
fn anyhow_errors_convert() {
    fn fails() -> EaselResult<()> {
        Err(anyhow::anyhow!("backend exploded"))?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert!(matches!(err, EaselError::Other(_)));
    assert_eq!(err.to_string(), "backend exploded");
}
