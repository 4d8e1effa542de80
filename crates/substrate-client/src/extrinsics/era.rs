// SPDX-License-Identifier: GPL-3.0

/// Longest period a mortal transaction can be valid for.
const MAX_PERIOD: u64 = 1 << 16;

/// Validity window of a transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Era {
	/// Valid forever, checkpointed at genesis.
	#[default]
	Immortal,
	/// Valid for a limited number of blocks, see [`Era::mortal`].
	Mortal(MortalEra),
}

/// Period and phase of a mortal era.
///
/// Only built by [`Era::mortal`], so the period is always a power of two between 4 and 65536 and
/// the phase is below it and quantized to fit the two byte encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MortalEra {
	period: u64,
	phase: u64,
}

impl MortalEra {
	/// Number of blocks the transaction stays valid for.
	pub fn period(&self) -> u64 {
		self.period
	}

	/// Block number modulo the period of the block the era starts at.
	pub fn phase(&self) -> u64 {
		self.phase
	}

	fn quantize_factor(&self) -> u64 {
		(self.period >> 12).max(1)
	}
}

impl Era {
	/// Era valid for about `period` blocks from `current`.
	///
	/// The period is rounded up to a power of two between 4 and 65536 and the phase is quantized
	/// so that the era fits its two byte encoding.
	pub fn mortal(period: u64, current: u64) -> Self {
		let period = period.checked_next_power_of_two().unwrap_or(MAX_PERIOD).clamp(4, MAX_PERIOD);
		let era = MortalEra { period, phase: current % period };
		let quantize_factor = era.quantize_factor();
		Era::Mortal(MortalEra { phase: era.phase / quantize_factor * quantize_factor, ..era })
	}

	/// Whether the era never expires.
	pub fn is_immortal(&self) -> bool {
		matches!(self, Era::Immortal)
	}

	/// Append the encoding of the era to `out`.
	pub fn encode_to(&self, out: &mut Vec<u8>) {
		match self {
			Era::Immortal => out.push(0),
			Era::Mortal(era) => {
				let low = (era.period.trailing_zeros().saturating_sub(1)).clamp(1, 15) as u16;
				let high = ((era.phase / era.quantize_factor()) << 4) as u16;
				out.extend_from_slice(&(low | high).to_le_bytes());
			},
		}
	}

	/// Encoded bytes of the era.
	pub fn encode(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(2);
		self.encode_to(&mut out);
		out
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn period_and_phase(era: Era) -> Option<(u64, u64)> {
		match era {
			Era::Immortal => None,
			Era::Mortal(era) => Some((era.period(), era.phase())),
		}
	}

	#[test]
	fn immortal_is_a_single_zero_byte() {
		assert_eq!(Era::Immortal.encode(), vec![0x00]);
		assert!(Era::default().is_immortal());
	}

	#[test]
	fn mortal_encoding() {
		// period 64, phase 42
		assert_eq!(Era::mortal(64, 42).encode(), vec![0xa5, 0x02]);
		// period 32768 quantizes the phase by 8
		assert_eq!(Era::mortal(32768, 20000).encode(), vec![0x4e, 0x9c]);
		assert!(!Era::mortal(64, 42).is_immortal());
	}

	#[test]
	fn mortal_constructor_rounds_and_quantizes() {
		assert_eq!(period_and_phase(Era::mortal(64, 42)), Some((64, 42)));
		assert_eq!(period_and_phase(Era::mortal(60, 1000)), Some((64, 1000 % 64)));
		assert_eq!(period_and_phase(Era::mortal(1, 5)), Some((4, 1)));
		assert_eq!(period_and_phase(Era::mortal(0, 5)), Some((4, 1)));
		assert_eq!(period_and_phase(Era::mortal(u64::MAX, 20001)), Some((65536, 20000)));
		assert_eq!(period_and_phase(Era::mortal(32768, 20003)), Some((32768, 20000)));
	}

	#[test]
	fn every_mortal_era_fits_two_bytes() {
		for (period, current) in [(4, 3), (100, 99), (4096, 4095), (8192, 8191), (65536, 65535), (65536, 12)] {
			let era = Era::mortal(period, current);
			let bytes = era.encode();
			assert_eq!(bytes.len(), 2);
			let encoded = u16::from_le_bytes([bytes[0], bytes[1]]);
			let (period, phase) = period_and_phase(era).unwrap_or_default();
			assert_eq!(2u64 << (encoded & 0x0f), period);
			assert_eq!(u64::from(encoded >> 4) * (period >> 12).max(1), phase);
		}
	}
}
