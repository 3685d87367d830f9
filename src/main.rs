extern crate clap;

extern crate eniconv;

use eniconv::{generate, parse_eni, Args, EniError, DEFAULT_INCLUDE};

use log::LevelFilter;
use std::fs::File;
use std::io::{self, BufWriter, Error, ErrorKind, Seek, SeekFrom};
use unicode_bom::Bom;


fn main() {
    ::std::process::exit(match main_() {
       Ok(_) => 0,
       Err(err) => {
           eprintln!("Failure: {}.", err);
           1
       }
    });
}


fn main_() -> Result<(), EniError> {
    let matches = clap::App::new("eniconv")
        .version("0.1")
        .about("Convert an ENI file to a C file suited for an SOEM application.")
        .arg(clap::Arg::with_name("eni")
             .value_name("ENI")
             .index(1)
             .required(true)
             .help("The ENI file to convert"))
        .arg(clap::Arg::with_name("outfile")
             .value_name("OUTFILE")
             .index(2)
             .required(false)
             .help("The output C file; standard output if omitted"))
        .arg(clap::Arg::with_name("include")
             .short("I")
             .long("include")
             .value_name("HEADER")
             .takes_value(true)
             .help("Header to include at the top of the C file"))
        .arg(clap::Arg::with_name("verbose")
             .short("v")
             .long("verbose")
             .multiple(true)
             .help("Be more verbose"))
        .get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => LevelFilter::Off,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    let fname_in = matches.value_of("eni").unwrap_or_default();
    let args = Args::new(matches.value_of("include").unwrap_or(DEFAULT_INCLUDE));

    log::info!("Processing file: {}", fname_in);

    let mut fd_in = File::open(fname_in)
        .map_err(|e| Error::new(e.kind(), format!("can't open '{}': {}", fname_in, e)))?;

    // Exporters on Windows like to prepend a BOM; skip a UTF-8 one and
    // reject anything that is not UTF-8.
    let bom = Bom::from(&mut fd_in);
    match bom {
        Bom::Null | Bom::Utf8 => fd_in.seek(SeekFrom::Start(bom.len() as u64))?,
        _ => {
            let msg = format!("unsupported Unicode file encoding: {}", bom);
            return Err(Error::new(ErrorKind::InvalidData, msg).into());
        }
    };

    // Parse everything before touching the output, so a broken ENI file
    // does not leave a truncated C file behind.
    let config = parse_eni(io::BufReader::new(fd_in))?;

    match matches.value_of("outfile") {
        Some(fname_out) => {
            log::info!("Writing file: {}", fname_out);
            let fd_out = File::create(fname_out)
                .map_err(|e| Error::new(e.kind(), format!("can't open '{}': {}", fname_out, e)))?;
            generate(&args, &config, BufWriter::new(fd_out))?;
        }
        None => {
            let stdout = io::stdout();
            generate(&args, &config, stdout.lock())?;
        }
    }
    Ok(())
}
