//! Expansion of user pet memories into 3D generation prompts.

use crate::client::{ArkClient, ArkError};

/// Build the prompt-master instruction wrapping a user description.
fn expansion_instruction(description: &str) -> String {
    format!(
        "1. 你是一名文生3D提示词大师。你现在需要将用户关于动物的回忆、描述扩写成详细动物 3D \
         模型生成提示词的任务。扩写时需遵循以下要求：\n\
         - 精准还原核心信息：紧扣用户描述中动物的种类、关键特征（如毛色、体型、特殊标记等）、\
         相关场景元素，确保不偏离用户原始回忆。\n\
         - 丰富细节维度：从动物的体态、毛发质感、五官细节、皮肤纹理等方面补充细节，\
         让 3D 模型生成更具画面感。\n\
         - 风格适配性：根据用户描述的情感倾向（如温馨、活泼、写实等），调整提示词的风格表述，\
         明确渲染风格。\n\
         请基于以上要求，将用户提供的动物回忆、描述扩写成适用的 3D 模型生成提示词，\
         字符数控制在150以内。\n\
         2. 请根据之前确定的规则，将用户提供的动物回忆、描述进行扩写【{description}】，\
         字符数控制在150以内"
    )
}

impl ArkClient {
    /// Rewrite a user's pet memory into a compact 3D generation prompt.
    pub async fn expand_model_prompt(&self, description: &str) -> Result<String, ArkError> {
        let messages = serde_json::json!([
            { "role": "user", "content": expansion_instruction(description) }
        ]);

        let content = self.complete(&self.config.expand_model, &messages).await?;
        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_embeds_description() {
        let text = expansion_instruction("老黄狗，右耳缺了个三角口");
        assert!(text.contains("【老黄狗，右耳缺了个三角口】"));
        assert!(text.contains("150以内"));
    }
}
