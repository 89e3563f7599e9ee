//! Photo → IP-figure image stylization.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;

use crate::client::{ArkClient, ArkError};

/// Generation knobs for the stylization call.
#[derive(Debug, Clone)]
pub struct StylizeOptions {
    pub seed: i64,
    pub guidance_scale: f64,
    pub size: String,
    pub watermark: bool,
}

impl Default for StylizeOptions {
    fn default() -> Self {
        Self {
            seed: 123,
            guidance_scale: 5.5,
            size: "adaptive".to_string(),
            watermark: true,
        }
    }
}

/// Image-generation response shape (only the fields we use).
#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImageEntry>,
}

#[derive(Debug, Deserialize)]
struct ImageEntry {
    url: Option<String>,
}

/// Build the IP-figure system prompt around a user description.
fn stylize_instruction(description: &str) -> String {
    format!(
        "基于参考照片动物，精准复刻特征，生成ip形象设计图。首先，让宠物处于宠物的站立姿势、\
         每一个色块的颜色和具体位置要百分百还原。\n\
         背景为纯白色（RGB 255,255,255），无杂色。结合用户描述特征【{description}】，\
         毛发还原毛色（含饱和度、渐变），完全还原毛发走势和质感，胡须保色泽韧性。\n\
         五官复刻眼球颜色、瞳孔形状，眼周毛走向，鼻子质感，嘴唇弧度；耳朵还原大小、弧度及内侧绒毛。\
         肢体按原图比例：颈、躯干、四肢骨骼，脚掌肉垫，尾巴形态。站姿符合习性，自然协调。\n\
         3D 渲染达高精度，毛发用 PBR 材质，显光影细节；三点布光，明暗分明。\
         形象保留原生特征，强化细节、增强亲和力。"
    )
}

impl ArkClient {
    /// Generate a stylized IP-figure image of a pet.
    ///
    /// `image_input` is either an http(s) URL (passed through) or a local
    /// file path, in which case the bytes are inlined as a base64 data URL.
    pub async fn stylize_image(
        &self,
        description: &str,
        image_input: &str,
        options: &StylizeOptions,
    ) -> Result<String, ArkError> {
        let image = self.resolve_image_input(image_input).await?;

        let body = serde_json::json!({
            "model": self.config.image_model,
            "prompt": stylize_instruction(description),
            "image": image,
            "seed": options.seed,
            "guidance_scale": options.guidance_scale,
            "size": options.size,
            "watermark": options.watermark,
        });

        let response = self
            .client
            .post(format!("{}/images/generations", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: ImagesResponse = Self::parse_response(response).await?;

        parsed
            .data
            .into_iter()
            .next()
            .and_then(|entry| entry.url)
            .ok_or(ArkError::EmptyResponse)
    }

    /// Pass URLs through; inline local files as a base64 data URL.
    async fn resolve_image_input(&self, image_input: &str) -> Result<String, ArkError> {
        if image_input.starts_with("http://") || image_input.starts_with("https://") {
            return Ok(image_input.to_string());
        }

        let bytes = tokio::fs::read(image_input)
            .await
            .map_err(|e| ArkError::ImageRead(format!("{image_input}: {e}")))?;

        Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_embeds_description() {
        let text = stylize_instruction("一只猕猴，很喜欢到处爬");
        assert!(text.contains("【一只猕猴，很喜欢到处爬】"));
        assert!(text.contains("纯白色"));
    }

    #[test]
    fn default_options_match_vendor_defaults() {
        let options = StylizeOptions::default();
        assert_eq!(options.seed, 123);
        assert!((options.guidance_scale - 5.5).abs() < f64::EPSILON);
        assert_eq!(options.size, "adaptive");
        assert!(options.watermark);
    }
}
