//! 实验结果.

use crate::profile::Profile;
use std::io::{self, Write};

/// 将 `profile` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.6}"),
            None => "/".to_string(),
        }
    }

    writeln!(w, "Profile `{name}`:")?;
    writeln!(w, "{S4}Volumes: {}", p.get_volumes())?;
    writeln!(w, "{S4}Failed detections: {}", p.get_failed())?;
    writeln!(w, "{S4}Expected blobs: {}", p.get_expected())?;
    writeln!(w, "{S4}Detected blobs: {}", p.get_found())?;
    writeln!(w, "{S4}Recall: {}", f64_to_display(p.get_recall()))?;
    writeln!(w, "{S4}Total time: {} us", p.get_time_us())?;
    writeln!(
        w,
        "{S4}Average time: {} us",
        f64_to_display(p.get_avg_time_us())
    )?;
    let t = p.get_most_time_consuming().map(|d| d.as_micros() as f64);
    write!(w, "{S4}Most time-consuming detection costs {} us", f64_to_display(t))?;
    Ok(())
}

/// 消融实验最终结果.
pub struct AblationResult {
    data: Vec<(String, Profile)>,
}

impl FromIterator<(String, Profile)> for AblationResult {
    fn from_iter<I: IntoIterator<Item = (String, Profile)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }
}

impl AblationResult {
    /// 输出运行结果.
    pub fn analyze(&self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        utils::sep_to(&mut out)?;
        for (key, profile) in self.data.iter() {
            describe_into(key, profile, &mut out)?;
            writeln!(out)?;
            utils::sep_to(&mut out)?;
        }
        Ok(())
    }
}
