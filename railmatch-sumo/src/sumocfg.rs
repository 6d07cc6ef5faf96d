use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::{routes, util::fs, xml::XmlWriter, SumoFileError};

/// contents of a simulation configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub net_file: PathBuf,
    pub route_files: Vec<PathBuf>,
    pub additional_files: Vec<PathBuf>,
    pub begin: f64,
    pub end: f64,
    pub tripinfo_output: Option<PathBuf>,
    pub stop_output: Option<PathBuf>,
}

impl SimulationConfig {
    /// a configuration using every route file in `route_directory` whose file name
    /// contains none of the `exclude` patterns.
    pub fn from_route_directory(
        net_file: &Path,
        route_directory: &Path,
        exclude: &[String],
    ) -> Result<Self, SumoFileError> {
        let all_files = routes::list_route_files(route_directory)?;
        let total = all_files.len();
        let route_files = all_files
            .into_iter()
            .filter(|path| {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default();
                !exclude.iter().any(|pattern| name.contains(pattern.as_str()))
            })
            .collect::<Vec<_>>();
        if route_files.is_empty() {
            let msg = format!(
                "no route files found in '{}' ({total} excluded)",
                route_directory.display()
            );
            return Err(SumoFileError::InvalidUserInput(msg));
        }
        log::info!(
            "found {} route files in '{}', {} excluded",
            route_files.len(),
            route_directory.display(),
            total - route_files.len()
        );
        Ok(Self {
            net_file: net_file.to_owned(),
            route_files,
            additional_files: vec![],
            begin: 0.0,
            end: 3600.0,
            tripinfo_output: None,
            stop_output: None,
        })
    }

    pub fn write(&self, path: &Path) -> Result<(), SumoFileError> {
        if self.end <= self.begin {
            let msg = format!(
                "simulation end {} must be after begin {}",
                self.end, self.begin
            );
            return Err(SumoFileError::InvalidUserInput(msg));
        }
        let Some(file) = fs::create_writer(path, true)? else {
            return Ok(());
        };
        let mut writer = XmlWriter::new(file, path)?;
        writer.start("configuration", &[])?;

        writer.start("input", &[])?;
        let net_file = self.net_file.display().to_string();
        writer.empty("net-file", &[("value", net_file.as_str())])?;
        let route_files = join_paths(&self.route_files);
        writer.empty("route-files", &[("value", route_files.as_str())])?;
        if !self.additional_files.is_empty() {
            let additional = join_paths(&self.additional_files);
            writer.empty("additional-files", &[("value", additional.as_str())])?;
        }
        writer.end()?;

        writer.start("time", &[])?;
        let begin = self.begin.to_string();
        let end = self.end.to_string();
        writer.empty("begin", &[("value", begin.as_str())])?;
        writer.empty("end", &[("value", end.as_str())])?;
        writer.end()?;

        if self.tripinfo_output.is_some() || self.stop_output.is_some() {
            writer.start("output", &[])?;
            if let Some(tripinfo) = &self.tripinfo_output {
                let value = tripinfo.display().to_string();
                writer.empty("tripinfo-output", &[("value", value.as_str())])?;
            }
            if let Some(stops) = &self.stop_output {
                let value = stops.display().to_string();
                writer.empty("stop-output", &[("value", value.as_str())])?;
            }
            writer.end()?;
        }

        writer.start("report", &[])?;
        writer.empty("verbose", &[("value", "true")])?;
        writer.empty("no-step-log", &[("value", "true")])?;
        writer.end()?;

        writer.finish()?;
        log::info!("simulation configuration written to '{}'", path.display());
        Ok(())
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display().to_string()).join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route_directory() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in ["mapped_routes_91-29.rou.xml", "mapped_routes_1.rou.xml", "b.rou.xml"] {
            std::fs::write(dir.path().join(name), "<routes/>").unwrap();
        }
        dir
    }

    #[test]
    fn test_excluded_patterns_are_skipped() {
        let dir = route_directory();
        let config = SimulationConfig::from_route_directory(
            Path::new("rail.net.xml"),
            dir.path(),
            &[String::from("91-29")],
        )
        .unwrap();
        assert_eq!(
            config.route_files,
            vec![
                dir.path().join("b.rou.xml"),
                dir.path().join("mapped_routes_1.rou.xml"),
            ]
        );
    }

    #[test]
    fn test_no_route_files_is_an_error() {
        let dir = route_directory();
        let result = SimulationConfig::from_route_directory(
            Path::new("rail.net.xml"),
            dir.path(),
            &[String::from(".rou.xml")],
        );
        assert!(matches!(result, Err(SumoFileError::InvalidUserInput(_))));
    }

    #[test]
    fn test_write_configuration() {
        let dir = route_directory();
        let mut config =
            SimulationConfig::from_route_directory(Path::new("rail.net.xml"), dir.path(), &[])
                .unwrap();
        config.additional_files = vec![PathBuf::from("vehicle_types.veh.xml")];
        config.end = 10000.0;
        config.tripinfo_output = Some(PathBuf::from("tripinfo.xml"));
        let path = dir.path().join("rail.sumocfg");
        config.write(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let doc = roxmltree::Document::parse(&text).unwrap();
        let value = |tag: &str| {
            doc.descendants()
                .find(|n| n.has_tag_name(tag))
                .and_then(|n| n.attribute("value"))
                .map(String::from)
        };
        assert_eq!(value("net-file").as_deref(), Some("rail.net.xml"));
        assert_eq!(value("route-files").map(|v| v.split(',').count()), Some(3));
        assert_eq!(value("additional-files").as_deref(), Some("vehicle_types.veh.xml"));
        assert_eq!(value("end").as_deref(), Some("10000"));
        assert_eq!(value("tripinfo-output").as_deref(), Some("tripinfo.xml"));
        assert_eq!(value("stop-output"), None);
        assert_eq!(value("no-step-log").as_deref(), Some("true"));
    }

    #[test]
    fn test_inverted_time_window_is_rejected() {
        let dir = route_directory();
        let mut config =
            SimulationConfig::from_route_directory(Path::new("rail.net.xml"), dir.path(), &[])
                .unwrap();
        config.begin = 100.0;
        config.end = 50.0;
        assert!(config.write(&dir.path().join("x.sumocfg")).is_err());
    }
}
