//! One pass of the road pipeline for the terminal.

use std::path::Path;

use ksi_map_cli_utils::{MultiProgress, Spinner};
use ksi_map_render::html::to_html;
use ksi_map_road_models::RoadId;
use ksi_map_routing::RouteFetcher;
use ksi_map_shell::{LoadedData, ViewModel, evaluate};

/// Evaluates `road` with a spinner while the route is fetched.
///
/// # Errors
///
/// Returns an error if `road` is not in the speed data.
pub async fn evaluate_with_spinner(
    multi: &MultiProgress,
    data: &LoadedData,
    road: &RoadId,
    router: &dyn RouteFetcher,
) -> Result<ViewModel, Box<dyn std::error::Error>> {
    log::debug!("Evaluating road {road}");
    let spinner = Spinner::start(multi, &format!("Fetching route for road {road}"));
    let view = evaluate(data, Some(road), router).await?;
    if view.map.is_some() {
        spinner.finish(format!("Route for road {road} ready"));
    } else {
        spinner.finish_and_clear();
        log::warn!("Road {road}: no map to write");
    }
    Ok(view)
}

/// Prints the view's status lines and table, and writes the map page to
/// `output` when there is a map.
///
/// Returns whether a map was written.
///
/// # Errors
///
/// Returns an error if the page cannot be rendered or written.
pub fn present(view: &ViewModel, output: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    for message in &view.messages {
        println!("{message}");
    }

    let Some(map) = &view.map else {
        return Ok(false);
    };

    let html = to_html(map, &format!("Road {}", view.road), view.table.as_ref())?;
    std::fs::write(output, &html)?;
    log::info!("Wrote {} bytes to {}", html.len(), output.display());
    println!(
        "Map for road {} written to {} ({} KSI markers)",
        view.road,
        output.display(),
        map.markers.len()
    );

    if let Some(table) = &view.table {
        println!();
        println!("Filtered KSI Data:");
        println!("{}", table.to_text());
    }

    Ok(true)
}

/// `{stem}_{road}.html` next to `base`, with unsafe file name characters
/// in the road replaced.
#[must_use]
pub fn output_path_for(base: &Path, road: &RoadId) -> std::path::PathBuf {
    let stem = base
        .file_stem()
        .map_or_else(|| "map".into(), |s| s.to_string_lossy());
    let road: String = road
        .as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    base.with_file_name(format!("{stem}_{road}.html"))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn output_path_includes_sanitized_road() {
        let path = output_path_for(Path::new("out/map.html"), &RoadId::new("R 1/2"));
        assert_eq!(path, PathBuf::from("out/map_R_1_2.html"));
    }

    #[test]
    fn view_without_map_writes_nothing() {
        let dir = std::env::temp_dir().join(format!(
            "ksi_map_present_{}_{}.html",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let view = ViewModel {
            road: RoadId::new("R1"),
            messages: Vec::new(),
            map: None,
            table: None,
        };
        assert!(!present(&view, &dir).unwrap());
        assert!(!dir.exists());
    }
}
