use crate::adapters::http::HttpFetcher;
use crate::domain::model::PlayerIdMapping;
use crate::domain::ports::PlayerRegister;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::io::{Cursor, Read};
use zip::ZipArchive;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Chadwick Bureau person register, served as the repository ZIP or a single CSV.
pub struct ChadwickRegister {
    fetcher: HttpFetcher,
    endpoint: String,
}

impl ChadwickRegister {
    pub fn new(fetcher: HttpFetcher, endpoint: impl Into<String>) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegisterRow {
    #[serde(default)]
    key_mlbam: Option<String>,
    #[serde(default)]
    key_fangraphs: Option<String>,
    #[serde(default)]
    name_first: Option<String>,
    #[serde(default)]
    name_last: Option<String>,
}

impl RegisterRow {
    fn into_mapping(self) -> Option<PlayerIdMapping> {
        // 註冊表有時把 ID 寫成浮點數
        fn parse_id(raw: Option<&str>) -> Option<u32> {
            let raw = raw?.trim();
            raw.parse::<u32>()
                .ok()
                .or_else(|| raw.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u32))
        }

        Some(PlayerIdMapping {
            fangraphs_id: parse_id(self.key_fangraphs.as_deref())?,
            mlbam_id: parse_id(self.key_mlbam.as_deref())?,
            name_first: self.name_first.unwrap_or_default(),
            name_last: self.name_last.unwrap_or_default(),
        })
    }
}

fn is_people_file(name: &str) -> bool {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    file_name.starts_with("people") && file_name.ends_with(".csv")
}

fn parse_register_csv(data: &[u8]) -> Result<Vec<PlayerIdMapping>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);
    let mut mappings = Vec::new();
    for row in reader.deserialize::<RegisterRow>() {
        if let Some(mapping) = row?.into_mapping() {
            mappings.push(mapping);
        }
    }
    Ok(mappings)
}

/// Reads the register from a ZIP archive (every `people*.csv` inside) or a plain CSV body.
pub fn parse_register(body: &[u8]) -> Result<Vec<PlayerIdMapping>> {
    if !body.starts_with(ZIP_MAGIC) {
        return parse_register_csv(body);
    }

    let mut archive = ZipArchive::new(Cursor::new(body))?;
    let mut mappings = Vec::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if !file.is_file() || !is_people_file(file.name()) {
            continue;
        }
        tracing::debug!("Reading register file {}", file.name());
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        mappings.extend(parse_register_csv(&contents)?);
    }
    Ok(mappings)
}

#[async_trait]
impl PlayerRegister for ChadwickRegister {
    async fn id_mappings(&self) -> Result<Vec<PlayerIdMapping>> {
        tracing::info!("📡 Loading Chadwick Bureau player register...");
        let body = self.fetcher.get_bytes(&self.endpoint, &[]).await?;
        let mappings = parse_register(&body)?;
        tracing::info!("📋 Loaded {} player ID mappings", mappings.len());
        Ok(mappings)
    }
}
