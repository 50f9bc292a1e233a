use clap::Parser;
use wbt_types::CaptureRegion;

use crate::{Args, parse_region};

#[test]
fn test_region_argument() {
    assert_eq!(
        parse_region("10, 20,300,40"),
        Ok(CaptureRegion {
            left: 10,
            top: 20,
            width: 300,
            height: 40,
        })
    );
    assert!(parse_region("-5,0,100,30").is_ok());
    assert!(parse_region("1,2,3").is_err());
    assert!(parse_region("1,2,0,4").is_err());
    assert!(parse_region("a,2,3,4").is_err());
}

#[test]
fn test_flags() {
    let args = Args::try_parse_from(["wbt", "--auto", "--region", "0,0,200,50"]).unwrap();
    assert!(args.auto);
    assert_eq!(args.region.map(|r| r.width), Some(200));
    assert!(args.config.is_none());
}
