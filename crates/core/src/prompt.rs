//! Prompt construction for the 3D generation vendor.
//!
//! Builds the Chinese description text sent to the text-to-3D model from
//! the traits a user entered for their pet.

/// Pet traits used to build a generation prompt.
///
/// All fields except `name` are optional; missing traits are simply left
/// out of the description.
#[derive(Debug, Clone, Default)]
pub struct PetTraits {
    pub name: String,
    pub species: Option<String>,
    pub gender: Option<String>,
    pub personality: Option<String>,
    pub hobby: Option<String>,
    pub story: Option<String>,
}

/// Build the vendor-facing description text for a pet.
///
/// The output is a single Chinese sentence chain ending with the fixed
/// generation instruction the model expects.
pub fn pet_description(traits: &PetTraits) -> String {
    let mut description = format!("这是一只名叫{}的", traits.name);

    match traits.species.as_deref() {
        Some(species) if !species.is_empty() => description.push_str(species),
        _ => description.push_str("小动物"),
    }

    if let Some(gender) = non_empty(&traits.gender) {
        description.push_str(&format!("，性别是{gender}"));
    }
    if let Some(personality) = non_empty(&traits.personality) {
        description.push_str(&format!("，性格{personality}"));
    }
    if let Some(hobby) = non_empty(&traits.hobby) {
        description.push_str(&format!("，喜欢{hobby}"));
    }
    if let Some(story) = non_empty(&traits.story) {
        description.push_str(&format!("。{story}"));
    }

    description.push_str("。请根据这些信息生成一个可爱、生动的3D模型。");
    description
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_traits() -> PetTraits {
        PetTraits {
            name: "小白".to_string(),
            species: Some("小狗".to_string()),
            gender: Some("公".to_string()),
            personality: Some("活泼可爱".to_string()),
            hobby: Some("玩球".to_string()),
            story: Some("喜欢和主人一起玩耍。".to_string()),
        }
    }

    #[test]
    fn description_includes_all_traits() {
        let text = pet_description(&full_traits());
        assert!(text.contains("小白"));
        assert!(text.contains("小狗"));
        assert!(text.contains("性别是公"));
        assert!(text.contains("性格活泼可爱"));
        assert!(text.contains("喜欢玩球"));
        assert!(text.contains("喜欢和主人一起玩耍"));
        assert!(text.ends_with("3D模型。"));
    }

    #[test]
    fn missing_species_uses_generic_animal() {
        let traits = PetTraits {
            name: "咪咪".to_string(),
            ..Default::default()
        };
        let text = pet_description(&traits);
        assert!(text.contains("名叫咪咪的小动物"));
    }

    #[test]
    fn empty_optional_traits_are_skipped() {
        let traits = PetTraits {
            name: "球球".to_string(),
            species: Some("猫咪".to_string()),
            gender: Some(String::new()),
            ..Default::default()
        };
        let text = pet_description(&traits);
        assert!(!text.contains("性别"));
        assert!(text.contains("猫咪"));
    }
}
