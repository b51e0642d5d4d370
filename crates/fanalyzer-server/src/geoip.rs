//! [`GeoLocator`] backed by a local MaxMind `.mmdb` database.

use std::{net::IpAddr, path::Path};

use fanalyzer_core::geo::GeoLocator;
use maxminddb::{Reader, geoip2};
use tracing::trace;

pub struct MaxMindLocator {
  reader: Reader<Vec<u8>>,
}

impl MaxMindLocator {
  pub fn open(path: &Path) -> Result<Self, maxminddb::MaxMindDbError> {
    let reader = Reader::open_readfile(path)?;
    Ok(Self { reader })
  }
}

impl GeoLocator for MaxMindLocator {
  fn country(&self, ip: IpAddr) -> Option<String> {
    let result = self.reader.lookup(ip).ok()?;
    let record: geoip2::Country = result.decode().ok()??;
    let country = record.country.iso_code.map(String::from);
    trace!(%ip, ?country, "geoip lookup");
    country
  }

  fn name(&self) -> &'static str { "MaxMind" }
}
