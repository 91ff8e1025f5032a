use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub dish_name: String,
    /// url to image
    pub image_url: String,
    pub is_published: bool,
}

impl Dish {
    /// Flip the publish flag in place.
    pub fn toggle(&mut self) {
        self.is_published = !self.is_published;
    }
}

/// Flip the publish flag of the dish with the given id. Returns false when no
/// dish matches.
pub fn toggle_in(dishes: &mut [Dish], id: &str) -> bool {
    let Some(dish) = dishes.iter_mut().find(|d| d.id == id) else {
        return false;
    };
    dish.toggle();
    true
}
