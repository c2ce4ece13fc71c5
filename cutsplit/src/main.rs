mod cli;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use cutsplit_core::{
    export_segments, format_time, parse_cut_list, plan_outputs, Config, ProgressEvent, Segment,
};
use indicatif::{HumanDuration, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::cli::build_cli;

fn describe_range(segment: &Segment) -> String {
    match segment.end_ms {
        Some(end) => format!(
            "from {} to {}",
            format_time(segment.start_ms),
            format_time(end)
        ),
        None => format!("from {} to end", format_time(segment.start_ms)),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();

    let cutlist_path = matches
        .get_one::<PathBuf>("cutlist")
        .expect("required argument");
    let input_path = matches
        .get_one::<PathBuf>("input")
        .expect("required argument");
    let output_dir = matches
        .get_one::<PathBuf>("output")
        .expect("required argument");
    let overwrite = matches.get_flag("overwrite");
    let dry_run = matches.get_flag("dry-run");

    let config = Config::builder(input_path, cutlist_path, output_dir)
        .overwrite(overwrite)
        .build()
        .with_context(|| {
            format!(
                "failed to create configuration for '{}'",
                input_path.display()
            )
        })?;

    let cut_list = parse_cut_list(&config.cutlist_path)?;
    for issue in cut_list.issues() {
        eprintln!("warning: skipped cut-list {issue}");
    }

    if dry_run {
        let plan = plan_outputs(&config, &cut_list).with_context(|| {
            format!("failed to plan segments for '{}'", input_path.display())
        })?;

        println!("Dry run: would generate {} segment(s):", plan.len());
        for planned in plan {
            println!(
                "  {} ({})",
                planned.path.display(),
                describe_range(&planned.segment)
            );
        }

        return Ok(());
    }

    let progress = ProgressBar::new(0);
    progress.set_draw_target(ProgressDrawTarget::stderr());

    let bar_style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());

    let progress_handle = progress.clone();
    let mut reporter = move |event: ProgressEvent<'_>| match event {
        ProgressEvent::LineSkipped(_) => {}
        ProgressEvent::Decoded {
            total_duration,
            segments,
        } => {
            progress_handle.set_style(bar_style.clone());
            progress_handle.set_length(segments as u64);
            progress_handle.enable_steady_tick(Duration::from_millis(100));
            progress_handle.set_message(format!("of {}", HumanDuration(total_duration)));
        }
        ProgressEvent::SegmentStarted { segment, .. } => {
            progress_handle.suspend(|| {
                println!(
                    "Extracting '{}' {}...",
                    segment.title,
                    describe_range(segment)
                )
            });
        }
        ProgressEvent::SegmentSaved { path, .. } => {
            progress_handle.suspend(|| println!("Saved {}", path.display()));
            progress_handle.inc(1);
        }
        ProgressEvent::Finish => {
            progress_handle.set_message(String::from("Completed"));
        }
    };

    let result = export_segments(&config, &cut_list, &mut reporter)
        .with_context(|| format!("failed to split '{}'", input_path.display()));

    progress.finish_and_clear();

    let summary = result?;
    log::info!(
        "wrote {} segment(s) to '{}'",
        summary.segments_written,
        config.output_dir.display()
    );

    Ok(())
}
