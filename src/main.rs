mod parse;
mod util;

use crate::parse::{Args, Command};
use crate::util::print_hms;
use clap::Parser;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use ufo_sightings::config::Config;
use ufo_sightings::export::save_to_csv;
use ufo_sightings::record::parse_timestamp;
use ufo_sightings::{
    ChangeNotifier, Listing, Location, NEW_SIGHTING, NewSighting, Sighting, SightingError,
    SightingId, SightingRepository, Status, Summary,
};

/// Ids that were asked for but did not resolve
pub fn get_failed_ids(requested: &[SightingId], found: &[Sighting]) -> Vec<SightingId> {
    let found_ids: std::collections::HashSet<SightingId> = found.iter().map(|s| s.id).collect();

    requested
        .iter()
        .filter(|id| !found_ids.contains(id))
        .copied()
        .collect()
}

pub fn print_sighting(sighting: &Sighting) {
    println!(
        "#{:<5} {:<11} {}  ({:.4}, {:.4})",
        sighting.id,
        sighting.status,
        sighting.date_time.format("%d %b %Y, %I:%M %p"),
        sighting.location.latitude,
        sighting.location.longitude
    );
    println!("       {}", sighting.description);
    if !sighting.witness_name.is_empty() {
        println!("       witness: {}", sighting.witness_name);
    }
    if let Some(picture) = &sighting.picture {
        println!("       picture: {}", picture);
    }
}

pub fn print_summary(sightings: &[Sighting]) {
    if sightings.is_empty() {
        println!("No sightings to summarize");
        return;
    }

    let summary = Summary::of(sightings);
    println!("\nSummary:");
    println!("Total sightings: {}", summary.total);
    println!("Confirmed: {}", summary.count(Status::Confirmed));
    println!("Unconfirmed: {}", summary.count(Status::Unconfirmed));

    if let (Some(earliest), Some(latest)) = (summary.earliest, summary.latest) {
        println!(
            "Date range: {} to {}",
            earliest.format("%Y-%m-%d"),
            latest.format("%Y-%m-%d")
        );
    }
}

fn report_degraded(listing: &Listing) {
    if let Some(e) = &listing.remote_error {
        eprintln!("warning: remote catalog unavailable, showing local sightings only ({e})");
    }
}

/// Resolve several ids concurrently, at most `max_concurrent` at a time.
async fn show_many(
    repo: &SightingRepository,
    ids: &[SightingId],
    max_concurrent: usize,
) -> Vec<Sighting> {
    let progress_bar = ProgressBar::new(ids.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
    {
        progress_bar.set_style(style.progress_chars("##-"));
    }
    progress_bar.set_message("Looking up sightings");

    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let tasks = ids.iter().map(|&id| {
        let permit = Arc::clone(&semaphore);
        let progress = progress_bar.clone();
        async move {
            let _permit = permit.acquire().await.ok()?;
            let result = repo.get_by_id(id).await;
            progress.inc(1);
            match result {
                Ok(sighting) => Some(sighting),
                Err(SightingError::NotFound(_)) => None,
                Err(e) => {
                    warn!("Lookup of sighting {} failed: {}", id, e);
                    None
                }
            }
        }
    });

    let found: Vec<Sighting> = join_all(tasks).await.into_iter().flatten().collect();
    progress_bar.finish_and_clear();
    found
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::try_parse()?;
    // Initialize logger
    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let mut config = Config::default()
        .with_base_url(&args.api_url)
        .with_timeout(Duration::from_secs(args.timeout));
    if let Some(dir) = &args.data_dir {
        config = config.with_data_dir(dir);
    }

    let notifier = Arc::new(ChangeNotifier::new());
    let subscription = notifier.subscribe(NEW_SIGHTING, |n| match n.sighting_id {
        Some(id) => info!("New sighting {} recorded", id),
        None => info!("New sighting recorded"),
    });
    let repo = SightingRepository::from_config(&config, Arc::clone(&notifier))?;

    let start = Instant::now();
    match args.command {
        Command::List { status } => {
            let listing = match status {
                Some(status) => repo.list_by_status(status.into()).await?,
                None => repo.list().await?,
            };
            report_degraded(&listing);
            for sighting in &listing.sightings {
                print_sighting(sighting);
            }
        }
        Command::Show { ids, concurrent } => {
            let found = show_many(&repo, &ids, concurrent).await;
            for sighting in &found {
                print_sighting(sighting);
            }
            let missing = get_failed_ids(&ids, &found);
            if !missing.is_empty() {
                eprintln!("Not found: {:?}", missing);
            }
            print_hms(&start);
        }
        Command::Add {
            description,
            lat,
            lon,
            name,
            contact,
            picture,
            date,
        } => {
            let mut submission = NewSighting::new(description, Location::new(lat, lon))
                .with_witness(name, contact);
            if let Some(picture) = picture {
                submission = submission.with_picture(picture);
            }
            if let Some(raw) = date {
                let at = parse_timestamp(&raw)
                    .ok_or_else(|| SightingError::Validation(format!("invalid date `{raw}`")))?;
                submission = submission.with_date_time(at);
            }

            let created = repo.add(submission).await?;
            println!("Recorded sighting #{}", created.id);
            print_sighting(&created);
        }
        Command::Export { output } => {
            let listing = repo.list().await?;
            report_degraded(&listing);
            save_to_csv(&listing.sightings, &output)?;
            println!("Exported {} sightings to {}", listing.sightings.len(), output.display());
        }
        Command::Summary => {
            let listing = repo.list().await?;
            report_degraded(&listing);
            print_summary(&listing.sightings);
        }
    }

    notifier.unsubscribe(subscription);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::StatusArg;
    use chrono::{TimeZone, Utc};

    fn sighting(id: SightingId) -> Sighting {
        Sighting {
            id,
            witness_name: String::new(),
            location: Location::new(0.0, 0.0),
            description: "disc".to_string(),
            picture: None,
            status: Status::Confirmed,
            date_time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            witness_contact: String::new(),
        }
    }

    #[test]
    fn test_get_failed_ids() {
        let requested = vec![1, 2, 3, 4, 5];
        let found = vec![sighting(1), sighting(3)];

        assert_eq!(get_failed_ids(&requested, &found), vec![2, 4, 5]);
    }

    #[test]
    fn test_args_add_accepts_negative_coordinates() {
        let args = Args::try_parse_from([
            "ufo-sightings",
            "add",
            "--description",
            "lights",
            "--lat",
            "-33.9",
            "--lon",
            "-70.6",
        ])
        .unwrap();

        match args.command {
            Command::Add { lat, lon, .. } => {
                assert_eq!(lat, -33.9);
                assert_eq!(lon, -70.6);
            }
            _ => panic!("expected the add command"),
        }
    }

    #[test]
    fn test_args_list_status_filter() {
        let args =
            Args::try_parse_from(["ufo-sightings", "list", "--status", "unconfirmed"]).unwrap();
        match args.command {
            Command::List {
                status: Some(status),
            } => {
                assert_eq!(status, StatusArg::Unconfirmed);
                assert_eq!(Status::from(status), Status::Unconfirmed);
            }
            _ => panic!("expected the list command"),
        }
    }
}
