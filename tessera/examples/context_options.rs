//! Reading and changing context options.

use tessera::{Context, ContextOption, TesseraError};

fn main() -> Result<(), TesseraError> {
    println!(
        "tessera {} (ZMTP {}.{})",
        tessera::version_string(),
        tessera::ZMTP_VERSION.0,
        tessera::ZMTP_VERSION.1
    );

    let ctx = Context::new()?;
    for option in [
        ContextOption::IoThreads(0),
        ContextOption::MaxSockets(0),
        ContextOption::SocketLimit(0),
        ContextOption::MessageHandleSize(0),
    ] {
        println!("{:<20} {:?}", option.name(), ctx.get(option.clone())?);
    }

    ctx.set(ContextOption::MaxSockets(2))?;
    let _a = ctx.register_socket()?;
    let _b = ctx.register_socket()?;
    match ctx.register_socket() {
        Err(e) => println!("third socket refused: {e} (errno {})", e.errno()),
        Ok(_) => println!("third socket unexpectedly allowed"),
    }

    if let Err(e) = ctx.set(ContextOption::SocketLimit(10)) {
        println!("read-only option: {e}");
    }

    ctx.terminate()?;
    println!("terminated: {}", ctx.is_terminated());
    Ok(())
}
