const EPS: f32 = 1e-8;

/// Mean and population standard deviation.
pub fn mean_std(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0., 0.);
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values.iter().map(|x| (*x - mean).powi(2)).sum::<f32>() / n;
    (mean, variance.sqrt())
}

pub fn normalize(values: &[f32], mean: f32, std: f32) -> Vec<f32> {
    values.iter().map(|x| (x - mean) / (std + EPS)).collect()
}

pub fn unnormalize(values: &[f32], mean: f32, std: f32) -> Vec<f32> {
    values.iter().map(|x| x * std + mean).collect()
}

/// Shifts and scales `values` to zero mean and unit standard deviation.
pub fn standardize(values: &[f32]) -> Vec<f32> {
    let (mean, std) = mean_std(values);
    normalize(values, mean, std)
}

#[cfg(test)]
mod test {
    use super::{mean_std, normalize, standardize, unnormalize};

    #[test]
    fn standardized_values_have_unit_moments() {
        let values = standardize(&[1., 2., 3., 4., 10.]);
        let (mean, std) = mean_std(&values);
        assert!(mean.abs() < 1e-5);
        assert!((std - 1.).abs() < 1e-4);
    }

    #[test]
    fn constant_values_do_not_blow_up() {
        let values = standardize(&[3., 3., 3.]);
        assert!(values.iter().all(|x| x.abs() < 1e-3));
        assert!(standardize(&[]).is_empty());
    }

    #[test]
    fn unnormalize_inverts_normalize() {
        let values = [0.5, -2., 7.];
        let restored = unnormalize(&normalize(&values, 1.5, 2.), 1.5, 2.);
        for (a, b) in values.iter().zip(restored) {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
