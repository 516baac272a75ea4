//! # 徽章渲染
//!
//! 把用户资料映射为视图模型并渲染成自包含的 SVG 文档，
//! 头像以 data URI 内嵌，等级进度以进度条呈现。

use crate::ftapi::User;

/// 进度条总宽度（像素）
const BAR_WIDTH: f64 = 280.0;

/// 徽章视图模型
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub avatar: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub cursus: String,
    pub grade: String,
    /// 等级整数部分
    pub level: f64,
    /// 等级小数部分，下限 0.001（零宽度进度条会渲染异常）
    pub experience: f64,
}

impl Profile {
    /// 从用户资料和头像 data URI 构建视图模型
    #[must_use]
    pub fn new(user: &User, avatar: impl Into<String>) -> Self {
        let level = user.level.trunc();
        let experience = user.level.fract().max(0.001);

        Self {
            avatar: avatar.into(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            cursus: user.cursus.clone(),
            grade: user.grade.clone(),
            level,
            experience,
        }
    }

    /// 渲染 SVG 徽章
    #[must_use]
    pub fn render_svg(&self) -> String {
        let name = escape_xml(&self.name);
        let email = escape_xml(&self.email);
        let role = escape_xml(&self.role);
        let cursus = escape_xml(&self.cursus);
        let grade = escape_xml(&self.grade);

        let filled = self.experience * BAR_WIDTH;
        let percent = self.experience * 100.0;

        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="460" height="140" viewBox="0 0 460 140" role="img" aria-label="42 profile badge">
  <style>
    .bg {{ fill: #0d1117; }}
    .name {{ font: 600 20px 'Segoe UI', Ubuntu, sans-serif; fill: #e6edf3; }}
    .meta {{ font: 400 12px 'Segoe UI', Ubuntu, sans-serif; fill: #8b949e; }}
    .level {{ font: 600 12px 'Segoe UI', Ubuntu, sans-serif; fill: #58a6ff; }}
    .bar-bg {{ fill: #21262d; }}
    .bar {{ fill: #58a6ff; }}
  </style>
  <rect class="bg" width="460" height="140" rx="8"/>
  <clipPath id="avatar-clip"><circle cx="70" cy="70" r="45"/></clipPath>
  <image href="{avatar}" x="25" y="25" width="90" height="90" preserveAspectRatio="xMidYMid slice" clip-path="url(#avatar-clip)"/>
  <text class="name" x="135" y="48">{name}</text>
  <text class="meta" x="135" y="68">{email}</text>
  <text class="meta" x="135" y="86">{role} &#183; {cursus} &#183; {grade}</text>
  <rect class="bar-bg" x="135" y="98" width="{BAR_WIDTH}" height="10" rx="5"/>
  <rect class="bar" x="135" y="98" width="{filled:.2}" height="10" rx="5"/>
  <text class="level" x="135" y="126">level {level:.0} &#8212; {percent:.0}%</text>
</svg>"##,
            avatar = self.avatar,
            level = self.level,
        )
    }
}

/// 转义 XML 文本内容
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(level: f64) -> User {
        User {
            email: "jdoe@student.42.fr".to_string(),
            name: "John Doe".to_string(),
            role: "student".to_string(),
            avatar_url: "https://cdn.intra.42.fr/users/jdoe.jpg".to_string(),
            grade: "Member".to_string(),
            level,
            cursus: "42cursus".to_string(),
        }
    }

    #[test]
    fn test_profile_splits_level_and_experience() {
        let profile = Profile::new(&test_user(21.42), "data:image/jpeg;base64,AAA");
        assert!((profile.level - 21.0).abs() < f64::EPSILON);
        assert!((profile.experience - 0.42).abs() < 1e-9);
    }

    #[test]
    fn test_experience_is_clamped_above_zero() {
        let profile = Profile::new(&test_user(42.0), "data:image/jpeg;base64,AAA");
        assert!((profile.level - 42.0).abs() < f64::EPSILON);
        assert!((profile.experience - 0.001).abs() < f64::EPSILON);
    }

    #[test]
    fn test_render_svg_contains_fields() {
        let profile = Profile::new(&test_user(11.5), "data:image/jpeg;base64,AAA");
        let svg = profile.render_svg();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("John Doe"));
        assert!(svg.contains("jdoe@student.42.fr"));
        assert!(svg.contains("level 11"));
        assert!(svg.contains("data:image/jpeg;base64,AAA"));
    }

    #[test]
    fn test_render_svg_escapes_markup_in_text() {
        let mut user = test_user(5.0);
        user.name = r#"<script>"x"&'y'</script>"#.to_string();
        let svg = Profile::new(&user, "data:image/jpeg;base64,AAA").render_svg();

        assert!(!svg.contains("<script>"));
        assert!(svg.contains("&lt;script&gt;"));
        assert!(svg.contains("&quot;x&quot;"));
        assert!(svg.contains("&amp;"));
    }

    #[test]
    fn test_escape_xml_passthrough() {
        assert_eq!(escape_xml("John Doe"), "John Doe");
        assert_eq!(escape_xml("a&b<c>"), "a&amp;b&lt;c&gt;");
    }
}
