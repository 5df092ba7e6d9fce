use crate::model::{AlarmLevel, Category};

/// Per-category alarm thresholds in mm/s: (category, warning above, alert
/// above). Mirrors the DS 38/2011 vibration-limit table. Comparisons are
/// strict, a reading equal to a threshold is not elevated.
const THRESHOLDS: &[(Category, f64, f64)] = &[
    (Category::Cat1, 6.0, 8.0),
    (Category::Cat2, 8.0, 12.0),
    (Category::Cat3, 15.0, 20.0),
];

/// Maps a peak particle velocity to an alarm level. Categories without a
/// table entry always read as normal.
pub fn classify(category: Category, ppv: f64) -> AlarmLevel {
    let Some(&(_, warning, alert)) = THRESHOLDS.iter().find(|(c, _, _)| *c == category) else {
        return AlarmLevel::Normal;
    };

    if ppv > alert {
        AlarmLevel::Alert
    } else if ppv > warning {
        AlarmLevel::Warning
    } else {
        AlarmLevel::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cat1_boundaries() {
        assert_eq!(classify(Category::Cat1, 6.0), AlarmLevel::Normal);
        assert_eq!(classify(Category::Cat1, 6.01), AlarmLevel::Warning);
        assert_eq!(classify(Category::Cat1, 8.0), AlarmLevel::Warning);
        assert_eq!(classify(Category::Cat1, 8.01), AlarmLevel::Alert);
    }

    #[test]
    fn test_cat2_boundaries() {
        assert_eq!(classify(Category::Cat2, 8.0), AlarmLevel::Normal);
        assert_eq!(classify(Category::Cat2, 8.01), AlarmLevel::Warning);
        assert_eq!(classify(Category::Cat2, 12.0), AlarmLevel::Warning);
        assert_eq!(classify(Category::Cat2, 12.01), AlarmLevel::Alert);
    }

    #[test]
    fn test_cat3_boundaries() {
        assert_eq!(classify(Category::Cat3, 15.0), AlarmLevel::Normal);
        assert_eq!(classify(Category::Cat3, 15.01), AlarmLevel::Warning);
        assert_eq!(classify(Category::Cat3, 20.0), AlarmLevel::Warning);
        assert_eq!(classify(Category::Cat3, 20.01), AlarmLevel::Alert);
    }

    #[test]
    fn test_unknown_category_is_always_normal() {
        assert_eq!(classify(Category::Unknown, 0.0), AlarmLevel::Normal);
        assert_eq!(classify(Category::Unknown, 999.0), AlarmLevel::Normal);
    }

    #[test]
    fn test_zero_ppv_is_normal_everywhere() {
        for cat in [Category::Cat1, Category::Cat2, Category::Cat3, Category::Unknown] {
            assert_eq!(classify(cat, 0.0), AlarmLevel::Normal);
        }
    }

    #[test]
    fn test_monotonic_in_ppv() {
        fn rank(level: AlarmLevel) -> u8 {
            match level {
                AlarmLevel::Normal => 0,
                AlarmLevel::Warning => 1,
                AlarmLevel::Alert => 2,
            }
        }

        for cat in [Category::Cat1, Category::Cat2, Category::Cat3, Category::Unknown] {
            let mut previous = 0u8;
            let mut ppv = 0.0;
            while ppv < 30.0 {
                let current = rank(classify(cat, ppv));
                assert!(current >= previous, "level dropped at ppv={} for {:?}", ppv, cat);
                previous = current;
                ppv += 0.05;
            }
        }
    }
}
