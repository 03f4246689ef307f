use std::sync::OnceLock;

/// Rissanen's recalibrated C0, exact at e(3) = 65536 plus the
/// ln2^5 / (1 - ln2) estimate of the remainder.
const C0: f64 = 2.86511;

const TABLE_MAX: usize = 2_000;
const E3: u64 = 65_536;

/// tabulated log2*(n) and C0(n) = sum_{k=1}^{n} 2^(-log2*(k)), n in 1..=TABLE_MAX
static TABLES: OnceLock<(Vec<f64>, Vec<f64>)> = OnceLock::new();

fn tables() -> &'static (Vec<f64>, Vec<f64>) {
    TABLES.get_or_init(|| {
        log::debug!("tabulating log2* and C0 up to {}", TABLE_MAX);
        let mut star = vec![0.0; TABLE_MAX];
        let mut c0max = vec![1.0; TABLE_MAX];
        for i in 1..TABLE_MAX {
            let cost = iterated_log2((i + 1) as u64);
            star[i] = cost;
            c0max[i] = c0max[i - 1] + 2f64.powf(-cost);
        }
        (star, c0max)
    })
}

fn iterated_log2(n: u64) -> f64 {
    let mut cost = 0.0;
    let mut term = (n as f64).log2();
    while term > 0.0 {
        cost += term;
        term = term.log2();
    }
    cost
}

/// log2*(n) = sum_{j>=1} max(0, log2^(j)(n)), zero for n = 1.
pub fn log2_star(n: u64) -> f64 {
    assert!(n > 0, "log2* domain is n >= 1");
    let (star, _) = tables();
    if (n as usize) <= star.len() {
        star[n as usize - 1]
    } else {
        iterated_log2(n)
    }
}

/// partial sum C0(n_max), tabulated up to 2,000 and integrated beyond.
///
/// the tail bound follows Rissanen: sum_a^b 2^(-log*(x)) < integral of
/// 2^(-log*(x)) dx, where log*(x) has exactly 4 compositions below
/// e(3) = 65536 and 5 in [e(3), 2^65536).
pub fn c0_max(n_max: u64) -> f64 {
    assert!(n_max >= 1);
    let (_, c0) = tables();
    if (n_max as usize) < c0.len() {
        c0[n_max as usize - 1]
    } else {
        let ln2 = 2f64.ln();
        let last = *c0.last().unwrap();
        if n_max < E3 {
            last + ln2.powi(4) * (log2_fold(n_max, 4) - log2_fold(TABLE_MAX as u64, 4))
        } else {
            last + ln2.powi(4) * (1.0 - log2_fold(TABLE_MAX as u64, 4))
                + ln2.powi(5) * log2_fold(n_max, 5)
        }
    }
}

/// j-fold composition of log2
fn log2_fold(n: u64, j: usize) -> f64 {
    let mut x = n as f64;
    for _ in 0..j {
        x = x.log2();
    }
    x
}

/// Rissanen's universal code length for the natural numbers, in nats:
/// (log2 C0 + log2*(n)) * ln 2.
pub fn universal_code_length(n: u64) -> f64 {
    assert!(n >= 1);
    let ln2 = 2f64.ln();
    (C0.ln() / ln2 + log2_star(n)) * ln2
}

/// universal code length bounded to 1..=n_max: C0 is replaced by the
/// partial sum C0(n_max).
pub fn bounded_universal_code_length(n: u64, n_max: u64) -> f64 {
    assert!(n >= 1);
    let ln2 = 2f64.ln();
    (c0_max(n_max).ln() / ln2 + log2_star(n)) * ln2
}
