use std::{io, process};

use clap::{App, Arg};
use toyjvm::{
    class_loader::BootstrapClassLoader,
    class_parser,
    interpreter::{ExecutionError, Interpreter, InterpreterOptions},
    Error,
};

fn main() {
    let matches = App::new("toyjvm")
        .version("0.1.0")
        .about("Runs a method of a single class file")
        .arg(
            Arg::with_name("classpath")
                .long("classpath")
                .value_name("DIR")
                .takes_value(true)
                .default_value("."),
        )
        .arg(
            Arg::with_name("method")
                .long("method")
                .short("m")
                .value_name("NAME")
                .takes_value(true)
                .default_value("main"),
        )
        .arg(
            Arg::with_name("max depth")
                .long("max-depth")
                .value_name("N")
                .takes_value(true)
                .help("Fails instead of nesting more than N calls"),
        )
        .arg(
            Arg::with_name("disassemble")
                .long("disassemble")
                .help("Prints the decoded instructions instead of running them"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Raises the log level, repeat for more"),
        )
        .arg(
            Arg::with_name("CLASS")
                .help("Class name on the class path, or a path to a .class file")
                .required(true)
                .index(1),
        )
        .get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .init();

    let max_call_depth = match matches.value_of("max depth").map(str::parse::<usize>).transpose() {
        Ok(depth) => depth,
        Err(err) => {
            log::error!("invalid --max-depth: {}", err);
            process::exit(2);
        }
    };
    let options = InterpreterOptions {
        max_call_depth,
        ..InterpreterOptions::default()
    };

    let loader = BootstrapClassLoader::new(matches.value_of("classpath").unwrap_or("."));
    let class = matches.value_of("CLASS").unwrap_or_default();
    let method = matches.value_of("method").unwrap_or("main");

    let result = if matches.is_present("disassemble") {
        disassemble(&loader, class, method)
    } else {
        execute(&loader, class, method, options)
    };

    if let Err(err) = result {
        log::error!("{:?} error: {}", err.kind(), err);
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

fn load(loader: &BootstrapClassLoader, class: &str) -> Result<Vec<u8>, Error> {
    let bytes = loader.load(class)?;
    log::info!("Loaded {} ({} bytes)", loader.locate(class).display(), bytes.len());
    Ok(bytes)
}

fn execute(
    loader: &BootstrapClassLoader,
    class: &str,
    method: &str,
    options: InterpreterOptions,
) -> Result<(), Error> {
    let class = class_parser::parse(&load(loader, class)?)?;
    let stdout = io::stdout();
    let mut interpreter = Interpreter::with_options(&class, stdout.lock(), options);
    if let Some(value) = interpreter.run(method)? {
        log::info!("{} returned {}", method, value);
    }
    Ok(())
}

fn disassemble(loader: &BootstrapClassLoader, class: &str, method: &str) -> Result<(), Error> {
    let class = class_parser::parse(&load(loader, class)?)?;
    println!(
        "class {} extends {} (flags {:#06x}, {} interfaces)",
        class.name().map_err(ExecutionError::from)?,
        class.super_name().map_err(ExecutionError::from)?,
        class.access_flags(),
        class.interfaces().len()
    );
    for (index, entry) in class.constant_pool().iter() {
        println!("{:>6} = {}", index.to_string(), entry);
    }

    println!("{}:", method);
    let instructions = class
        .find_instructions(method)
        .map_err(ExecutionError::from)?;
    for (index, instruction) in instructions.iter().enumerate() {
        println!("{:>4}: {}", index, instruction);
    }
    Ok(())
}
