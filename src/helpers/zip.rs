//! ZIP container access for xlsx workbooks

use crate::error::DashboardError;
use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

/// Lookup of workbook parts inside the package
pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Gets a part by name, ignoring ASCII case and path separator style
    fn part(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, DashboardError>;

    /// Opens an XML reader over a part, `None` when the part does not exist
    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, DashboardError>;
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn part(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, DashboardError> {
        let wanted = name.replace('\\', "/");
        let stored = self
            .file_names()
            .find(|file_name| wanted.eq_ignore_ascii_case(&file_name.replace('\\', "/")))
            .map(|file_name| file_name.to_owned());
        match stored.map(|file_name| self.by_name(&file_name)).transpose() {
            Ok(part) => Ok(part),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, DashboardError> {
        Ok(self.part(name)?.map(|part| XmlReader::new(BufReader::new(part))))
    }
}
