//! Utilities

// Modules
pub mod logger;

// Imports
use {
	itertools::Itertools,
	std::{ffi::OsStr, process},
};

/// Extension trait for [`process::Command`] to render it as a shell-like line
#[extend::ext(name = CommandDisplay)]
pub impl process::Command {
	/// Renders this command as `ENV=value program arg...`.
	///
	/// Arguments with whitespace or quotes are single-quoted. Only variables
	/// explicitly set on the command are shown.
	fn to_shell_line(&self) -> String {
		let envs = self.get_envs().filter_map(|(key, value)| {
			let value = value?;
			Some(format!("{}={}", key.to_string_lossy(), self::quote(value)))
		});
		let program = std::iter::once(self::quote(self.get_program()));
		let args = self.get_args().map(self::quote);

		envs.chain(program).chain(args).join(" ")
	}
}

/// Quotes `s` for display if it contains whitespace or quotes
fn quote(s: &OsStr) -> String {
	let s = s.to_string_lossy();
	match s.is_empty() || s.contains(|ch: char| ch.is_whitespace() || ch == '\'' || ch == '"') {
		true => format!("'{}'", s.replace('\'', r"'\''")),
		false => s.into_owned(),
	}
}
