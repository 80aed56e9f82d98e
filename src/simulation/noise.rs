use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

/// Mean power of a signal
pub fn signal_power(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    signal.iter().map(|x| x * x).sum::<f64>() / signal.len() as f64
}

/// Gaussian white noise of standard deviation `std_dev`
pub fn white_noise(len: usize, std_dev: f64, seed: Option<u64>) -> Vec<f64> {
    let mut rng = create_rng(seed);
    let Ok(normal) = Normal::new(0.0, std_dev) else {
        return vec![0.0; len];
    };
    (0..len).map(|_| normal.sample(&mut rng)).collect()
}

/// Add white noise so the result has the requested SNR
pub fn add_white_noise(signal: &[f64], snr_db: f64, seed: Option<u64>) -> Vec<f64> {
    let power = signal_power(signal);
    let noise_std = (power / 10f64.powf(snr_db / 10.0)).sqrt();
    let noise = white_noise(signal.len(), noise_std, seed);
    signal.iter().zip(noise).map(|(s, n)| s + n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_noise_is_reproducible() {
        assert_eq!(white_noise(64, 0.1, Some(7)), white_noise(64, 0.1, Some(7)));
        assert_ne!(white_noise(64, 0.1, Some(7)), white_noise(64, 0.1, Some(8)));
    }

    #[test]
    fn test_add_white_noise_snr() {
        let signal: Vec<f64> = (0..20000).map(|n| (n as f64 * 0.05).sin()).collect();
        let noisy = add_white_noise(&signal, 20.0, Some(1));
        let noise: Vec<f64> = noisy.iter().zip(&signal).map(|(a, b)| a - b).collect();
        let snr = 10.0 * (signal_power(&signal) / signal_power(&noise)).log10();
        assert!((snr - 20.0).abs() < 0.5, "measured SNR {}", snr);
    }
}
