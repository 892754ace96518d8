pub const DRACO_DISPLAY_VERSION: &str = env!("DRACO_DISPLAY_VERSION");
pub const DRACO_BUILD_N: &str = env!("DRACO_BUILD_N");

pub fn version_cli_text() -> String {
    format!(
        "DRACO {}\nBuild {}\nDirect Repeat Aware Codon Optimizer",
        DRACO_DISPLAY_VERSION, DRACO_BUILD_N
    )
}
