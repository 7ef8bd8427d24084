// mapc-csr: throughput-optimal scheduling for Wi-Fi coordinated spatial reuse
// Copyright (C) 2024 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Physical-layer constants of IEEE 802.11ax and the default solver parameters.
//!
//! The data rates and SNR thresholds describe a 20 MHz channel with a single spatial stream and
//! 800 ns guard interval. The SNR thresholds are the means of success-probability curves fitted to
//! ns-3 simulations, shifted by a fixed margin to reach a 99.5% success probability.

use lazy_static::lazy_static;

/// Maximum transmission power in dBm.
pub const MAX_TX_POWER: f64 = 20.0;

/// Minimum transmission power in dBm.
pub const MIN_TX_POWER: f64 = 10.0;

/// Thermal noise floor in dBm for a 20 MHz channel.
pub const NOISE_FLOOR: f64 = -93.97;

/// Central frequency in GHz (channel 32 in the 5 GHz band).
pub const CENTRAL_FREQUENCY: f64 = 5.160;

/// Attenuation of a single wall in dB.
pub const WALL_LOSS: f64 = 7.0;

/// Breakpoint distance of the TGax path-loss model in meters.
pub const BREAKING_POINT: f64 = 10.0;

/// Reference distance of the TGax path-loss model in meters. Smaller distances are clipped.
pub const REFERENCE_DISTANCE: f64 = 1.0;

/// Data rates in Mb/s for each MCS (20 MHz channel, single spatial stream, 800 ns GI).
pub const DATA_RATES: [f64; 12] = [
    8.6, 17.2, 25.8, 34.4, 51.6, 68.8, 77.4, 86.0, 103.2, 114.7, 129.0, 143.2,
];

/// Mean SNR in dB of the per-MCS success-probability curves, derived from ns-3 simulations.
pub const MEAN_SNRS: [f64; 12] = [
    10.613624240405125,
    10.647249582547907,
    10.660723984151614,
    10.682584060100158,
    11.151267538857537,
    15.413200906170632,
    16.735812667249125,
    18.091175930406580,
    21.806290592040960,
    23.331824973610920,
    29.788906076547470,
    31.750234694079595,
];

/// Margin in dB added to the mean SNR to reach a 99.5% success probability.
const SNR_MARGIN: f64 = 5.1516595;

lazy_static! {
    /// Minimal SNR in dB required on each MCS for a 99.5% success probability.
    pub static ref MIN_SNRS: [f64; 12] = {
        let mut snrs = MEAN_SNRS;
        for snr in snrs.iter_mut() {
            *snr += SNR_MARGIN;
        }
        snrs
    };
}
