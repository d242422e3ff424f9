use std::error::Error;

use vergen_gitcl::{Cargo, Emitter, Gitcl};

fn main() -> Result<(), Box<dyn Error>> {
	let cargo = Cargo::builder().target_triple(true).build();
	let gitcl = Gitcl::builder().sha(true).build();

	Emitter::default().add_instructions(&cargo)?.add_instructions(&gitcl)?.emit()?;

	Ok(())
}
