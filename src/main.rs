use clap::{arg, crate_version, Command};
use d64compress::{d64, jaguar, Error};

const RCH: &str = "unreachable was reached";

/// Runs `attempt` against progressively larger output buffers until it
/// succeeds or a 256 MiB ceiling is reached. The codecs in this crate take a
/// fixed-capacity output slice and report `Error::OutputOverflow` rather than
/// growing one themselves, so the CLI supplies the retry loop.
fn with_growing_buffer(
    initial_capacity: usize,
    mut attempt: impl FnMut(&mut [u8]) -> Result<usize, Error>,
) -> Result<Vec<u8>, Error> {
    const CEILING: usize = 256 * 1024 * 1024;
    let mut capacity = initial_capacity.max(64);
    loop {
        let mut buf = vec![0u8; capacity];
        match attempt(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                return Ok(buf);
            }
            Err(Error::OutputOverflow) if capacity < CEILING => {
                capacity *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let long_help = "Examples:
---------
Compress:      `d64compress compress -m d64 -i my_expanded -o my_compressed`
Expand:        `d64compress expand -m d64 -i my_compressed -o my_expanded`";

    let methods = ["d64", "jaguar"];

    let mut main_cmd = Command::new("d64compress")
        .about("Compress and expand Doom 64 / Jaguar Doom retro formats")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(
        Command::new("compress")
            .arg(arg!(-m --method <METHOD> "compression algorithm").value_parser(methods).required(true))
            .arg(arg!(-i --input <PATH> "input path").required(true))
            .arg(arg!(-o --output <PATH> "output path").required(true))
            .about("compress a file"),
    );

    main_cmd = main_cmd.subcommand(
        Command::new("expand")
            .arg(arg!(-m --method <METHOD> "compression algorithm").value_parser(methods).required(true))
            .arg(arg!(-i --input <PATH> "input path").required(true))
            .arg(arg!(-o --output <PATH> "output path").required(true))
            .about("expand a file"),
    );

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let method = cmd.get_one::<String>("method").expect(RCH);
        let dat = std::fs::read(path_in)?;
        log::info!("compressing {} bytes from {} with {}", dat.len(), path_in, method);
        let compressed = match method.as_str() {
            "d64" => with_growing_buffer(dat.len() * 2 + 256, |out| d64::encode_d64(&dat, out))?,
            "jaguar" => with_growing_buffer(dat.len() * 9 / 8 + 1, |out| jaguar::encode_jaguar(&dat, out))?,
            _ => {
                eprintln!("{} not supported", method);
                return Err(Box::new(std::fmt::Error));
            }
        };
        std::fs::write(path_out, &compressed)?;
        log::info!("wrote {} compressed bytes to {}", compressed.len(), path_out);
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let method = cmd.get_one::<String>("method").expect(RCH);
        let dat = std::fs::read(path_in)?;
        log::info!("expanding {} bytes from {} with {}", dat.len(), path_in, method);
        let expanded = match method.as_str() {
            "d64" => with_growing_buffer(dat.len() * 4 + 256, |out| d64::decode_d64(&dat, out))?,
            "jaguar" => with_growing_buffer(dat.len() * 4 + 256, |out| jaguar::decode_jaguar(&dat, out))?,
            _ => {
                eprintln!("{} not supported", method);
                return Err(Box::new(std::fmt::Error));
            }
        };
        std::fs::write(path_out, &expanded)?;
        log::info!("wrote {} expanded bytes to {}", expanded.len(), path_out);
    }

    Ok(())
}
