//! Interactive road explorer.
//!
//! Prompts for the two CSV files, then lets the user pick roads one at a
//! time. Each pick fetches the route, prints the status lines and the
//! filtered table, and writes the map next to the chosen output path.

use std::path::{Path, PathBuf};

use dialoguer::{Input, Select};
use ksi_map_cli_utils::MultiProgress;
use ksi_map_routing::RouteFetcher;
use ksi_map_shell::{LoadedData, UPLOAD_PROMPT};

use crate::pipeline::{evaluate_with_spinner, output_path_for, present};

/// Runs the explorer until the user quits.
///
/// # Errors
///
/// Returns an error if reading user input or writing a map fails.
#[allow(clippy::future_not_send)]
pub async fn run(
    multi: &MultiProgress,
    router: &dyn RouteFetcher,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{UPLOAD_PROMPT}");
    println!();

    let output: String = Input::new()
        .with_prompt("Map output file")
        .default("map.html".to_string())
        .interact_text()?;
    let output = PathBuf::from(output);

    'files: loop {
        let Some(data) = prompt_for_data()? else {
            return Ok(());
        };

        let mut labels: Vec<String> = data.choices.iter().map(ToString::to_string).collect();
        let load_other = labels.len();
        labels.push("<load different files>".to_string());
        let quit = labels.len();
        labels.push("<quit>".to_string());

        let mut default = 0;
        loop {
            let idx = Select::new()
                .with_prompt("Select a Road Number")
                .items(&labels)
                .default(default)
                .interact()?;

            if idx == load_other {
                continue 'files;
            }
            if idx == quit {
                return Ok(());
            }
            default = idx;

            let road = &data.choices[idx];
            let view = evaluate_with_spinner(multi, &data, road, router).await?;
            present(&view, &output_path_for(&output, road))?;
            println!();
        }
    }
}

/// Asks for both file paths until they load, or returns `None` if the
/// user leaves a path empty.
fn prompt_for_data() -> Result<Option<LoadedData>, Box<dyn std::error::Error>> {
    loop {
        let speed: String = Input::new()
            .with_prompt("Speed data CSV (empty to quit)")
            .allow_empty(true)
            .interact_text()?;
        if speed.trim().is_empty() {
            return Ok(None);
        }

        let ksi: String = Input::new()
            .with_prompt("KSI data CSV (empty to quit)")
            .allow_empty(true)
            .interact_text()?;
        if ksi.trim().is_empty() {
            return Ok(None);
        }

        match LoadedData::from_paths(Path::new(speed.trim()), Path::new(ksi.trim())) {
            Ok(data) => {
                log::info!("Loaded {} and {}", speed.trim(), ksi.trim());
                println!("{} roads available", data.choices.len());
                return Ok(Some(data));
            }
            Err(e) => {
                log::error!("Failed to load data files: {e}");
                println!("[error] {e}");
                println!();
            }
        }
    }
}
