use super::*;

const URI: &str = "https://remote.example/users/alice";

#[test]
fn declared_length_over_the_limit_is_refused_before_reading() {
    let err = CappedBody::new(URI, Some(11), 10).expect_err("in test");
    assert!(matches!(err, Error::TooLarge { limit: 10, .. }));
    assert!(!err.is_transient());
}

#[test]
fn chunks_are_collected_up_to_the_limit() -> Result<(), Error> {
    let mut body = CappedBody::new(URI, Some(10), 10)?;
    body.extend(b"{\"id\":")?;
    body.extend(b"1}  ")?;
    assert_eq!(body.into_inner(), b"{\"id\":1}  ".to_vec());
    Ok(())
}

#[test]
fn undeclared_body_is_cut_off_once_it_overflows() -> Result<(), Error> {
    let mut body = CappedBody::new(URI, None, 8)?;
    body.extend(b"12345")?;
    let err = body.extend(b"6789").expect_err("in test");
    assert_eq!(
        err.to_string(),
        "https://remote.example/users/alice is larger than 8 bytes"
    );
    Ok(())
}

#[test]
fn understated_length_does_not_raise_the_limit() -> Result<(), Error> {
    let mut body = CappedBody::new(URI, Some(2), 4)?;
    body.extend(b"abcd")?;
    assert!(body.extend(b"e").is_err());
    Ok(())
}

#[test]
fn default_limit_is_one_mebibyte() {
    assert_eq!(MAX_FETCH_BYTES, 1 << 20);
    assert!(CappedBody::new(URI, Some(MAX_FETCH_BYTES as u64), MAX_FETCH_BYTES).is_ok());
}
