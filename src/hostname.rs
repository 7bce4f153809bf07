//! Service hostname value type with separate comparison and display projections.
//!
//! Full IDNA mapping is out of scope for this crate: [`Hostname::for_comparison`]
//! expects a name that has already been mapped to its ASCII form and only applies
//! case folding plus a structural sanity check. The comparison form keys every
//! cache and alias map; the display form appears only in error messages.

// std
use std::hash::{Hash, Hasher};
// self
use crate::_prelude::*;

/// A validated service hostname, optionally carrying a `:port` suffix.
///
/// Equality and hashing are defined on the comparison-normalized form only, so
/// two values constructed from differently-cased input collide in maps.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hostname {
	normalized: String,
	display: String,
}
impl Hostname {
	/// Validates `value` and produces the comparison-normalized hostname.
	pub fn for_comparison(value: impl AsRef<str>) -> Result<Self, HostnameError> {
		let display = value.as_ref();

		if display.is_empty() {
			return Err(HostnameError::Empty);
		}
		if !display.is_ascii() {
			return Err(HostnameError::NotAscii);
		}
		if let Some(character) =
			display.chars().find(|c| c.is_ascii_whitespace() || "/@?#\\".contains(*c))
		{
			return Err(HostnameError::InvalidCharacter { character });
		}

		Ok(Self { normalized: display.to_ascii_lowercase(), display: display.to_owned() })
	}

	/// Returns the comparison-normalized form used as map key and wire hostname.
	pub fn as_str(&self) -> &str {
		&self.normalized
	}

	/// Returns the human-readable form, used only in error messages.
	pub fn for_display(&self) -> &str {
		&self.display
	}
}
impl PartialEq for Hostname {
	fn eq(&self, other: &Self) -> bool {
		self.normalized == other.normalized
	}
}
impl Eq for Hostname {}
impl Hash for Hostname {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.normalized.hash(state);
	}
}
impl Debug for Hostname {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Hostname({})", self.normalized)
	}
}
impl Display for Hostname {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.display)
	}
}
impl FromStr for Hostname {
	type Err = HostnameError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::for_comparison(s)
	}
}
impl TryFrom<String> for Hostname {
	type Error = HostnameError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::for_comparison(value)
	}
}
impl From<Hostname> for String {
	fn from(value: Hostname) -> Self {
		value.normalized
	}
}

/// Error returned when hostname validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum HostnameError {
	/// The hostname was empty.
	#[error("Hostname cannot be empty.")]
	Empty,
	/// The hostname contains non-ASCII characters; apply IDNA mapping first.
	#[error("Hostname must be in its ASCII form; apply IDNA mapping before use.")]
	NotAscii,
	/// The hostname contains a structurally invalid character.
	#[error("Hostname contains invalid character {character:?}.")]
	InvalidCharacter {
		/// First offending character found.
		character: char,
	},
}
