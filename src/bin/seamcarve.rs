use seamcarve::{
    AspectRatio, CarvableImage, Carve, DynamicProgramming, Energy, ProtectionRegion,
    StaticRegions,
};
use std::process;

use clap::{App, Arg, ArgMatches};
use failure::{format_err, Error, ResultExt};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn app() -> App<'static, 'static> {
    App::new("seamcarve")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Content-aware image resizing by seam carving")
        .arg(
            Arg::with_name("input")
                .help("The image to carve")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .help("Where to write the carved image")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::with_name("width")
                .long("width")
                .takes_value(true)
                .help("Target width in pixels"),
        )
        .arg(
            Arg::with_name("height")
                .long("height")
                .takes_value(true)
                .help("Target height in pixels"),
        )
        .arg(
            Arg::with_name("aspect")
                .long("aspect")
                .short("a")
                .takes_value(true)
                .conflicts_with_all(&["width", "height"])
                .help("Carve down to an aspect ratio such as 16:9"),
        )
        .arg(
            Arg::with_name("energy")
                .long("energy")
                .short("e")
                .takes_value(true)
                .possible_values(&Energy::NAMES)
                .default_value("squared-difference")
                .help("Energy function used to score pixels"),
        )
        .arg(
            Arg::with_name("protect")
                .long("protect")
                .short("p")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .help("Keep seams out of the rectangle x,y,width,height (may repeat)"),
        )
}

fn parse_dimension(matches: &ArgMatches, name: &str) -> Result<Option<u32>, Error> {
    matches
        .value_of(name)
        .map(|v| {
            v.parse::<u32>()
                .map_err(|e| format_err!("invalid --{} '{}': {}", name, v, e))
        })
        .transpose()
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let input = matches.value_of("input").unwrap_or_default();
    let output = matches.value_of("output").unwrap_or_default();
    let energy: Energy = matches
        .value_of("energy")
        .unwrap_or_default()
        .parse()
        .map_err(|e: String| format_err!("{}", e))?;
    let regions = matches
        .values_of("protect")
        .map(|values| values.map(str::parse).collect::<Result<Vec<ProtectionRegion>, _>>())
        .transpose()
        .map_err(|e: String| format_err!("{}", e))?
        .unwrap_or_default();

    let image = image::open(input)
        .with_context(|e| format!("cannot read {}: {}", input, e))?
        .to_rgb8();
    let (width, height) = image.dimensions();
    info!(input, width, height, %energy, "loaded image");

    let mut carver = CarvableImage::with_strategies(image, energy, DynamicProgramming)?
        .with_progress(|p| debug!(completed = p.completed, total = p.total, direction = ?p.direction, "seam"));

    let (target_width, target_height) = match matches.value_of("aspect") {
        Some(ratio) => {
            let ratio: AspectRatio = ratio.parse()?;
            let (vertical, horizontal) = seamcarve::seams_for_aspect_ratio(width, height, ratio);
            (width - vertical, height - horizontal)
        }
        None => (
            parse_dimension(matches, "width")?.unwrap_or(width),
            parse_dimension(matches, "height")?.unwrap_or(height),
        ),
    };

    if regions.is_empty() {
        carver.resize(target_width, target_height)?;
    } else {
        let detector = StaticRegions(regions);
        for (direction, from, to) in [
            (Carve::Width, width, target_width),
            (Carve::Height, height, target_height),
        ]
        .iter()
        {
            match (direction, to < from) {
                (Carve::Width, true) => carver.reduce_with_protection(from - to, &detector)?,
                (Carve::Height, true) => {
                    carver.reduce_height_with_protection(from - to, &detector)?
                }
                (Carve::Width, false) => carver.enlarge(to - from)?,
                (Carve::Height, false) => carver.enlarge_height(to - from)?,
            }
        }
    }

    let carved = carver.into_image();
    info!(output, width = carved.width(), height = carved.height(), "saving");
    carved
        .save(output)
        .with_context(|e| format!("cannot write {}: {}", output, e))?;
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seamcarve=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let matches = app().get_matches();
    if let Err(e) = run(&matches) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
