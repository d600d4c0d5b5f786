#![allow(dead_code)]

use std::path::PathBuf;

use cupping_radar::config::ReportConfig;
use cupping_radar::model::{MetadataTable, ScoreTable};
use cupping_radar::sources::{
    CsvMetadataSource, CsvScoreSource, MetadataSource, ScoreSource,
};

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

pub fn score_source(config: &ReportConfig) -> CsvScoreSource {
    CsvScoreSource::new(fixture("radar.csv"), config)
}

pub fn metadata_source(config: &ReportConfig) -> CsvMetadataSource {
    CsvMetadataSource::new(fixture("fato_tipo_de_cafe.csv"), config)
}

pub fn load_fixtures(config: &ReportConfig) -> (ScoreTable, MetadataTable) {
    let scores = score_source(config).load_scores().expect("load score fixture");
    let metadata = metadata_source(config)
        .load_metadata()
        .expect("load metadata fixture");
    (scores, metadata)
}
