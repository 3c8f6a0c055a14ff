use super::{DependencyModel, RawDependency};

/// 可编辑的依赖序列，允许存在空洞
#[derive(Clone, Debug, Default)]
pub struct DependencyManager {
    dependencies: Vec<Option<DependencyModel>>,
}

impl DependencyManager {
    pub fn new(dependencies: Vec<Option<DependencyModel>>) -> Self {
        Self { dependencies }
    }

    pub fn dependencies(&self) -> &[Option<DependencyModel>] {
        &self.dependencies
    }

    pub fn into_dependencies(self) -> Vec<Option<DependencyModel>> {
        self.dependencies
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn get_index(&self, index: usize) -> Option<&DependencyModel> {
        self.dependencies.get(index).and_then(Option::as_ref)
    }

    /// 追加一个已定义的依赖
    pub fn push(&mut self, dependency: impl Into<RawDependency>) -> &mut Self {
        self.dependencies.push(Some(DependencyModel::new(dependency)));
        self
    }

    pub fn append<I>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = Option<RawDependency>>,
    {
        self.dependencies
            .extend(items.into_iter().map(DependencyModel::coerce));
        self
    }

    /// 在 `index` 处替换，不足时以空洞补齐
    pub fn set_index(&mut self, index: usize, item: Option<RawDependency>) -> &mut Self {
        if index >= self.dependencies.len() {
            self.dependencies.resize(index + 1, None);
        }
        self.dependencies[index] = DependencyModel::coerce(item);
        self
    }

    pub fn insert_index(&mut self, index: usize, item: Option<RawDependency>) -> &mut Self {
        if index > self.dependencies.len() {
            self.dependencies.resize(index, None);
        }
        self.dependencies.insert(index, DependencyModel::coerce(item));
        self
    }

    /// 只填补空洞并追加超出部分，已有条目保持不变
    pub fn merge<I>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = Option<DependencyModel>>,
    {
        for (index, item) in items.into_iter().enumerate() {
            match self.dependencies.get_mut(index) {
                Some(existing) => {
                    if existing.is_none() {
                        *existing = item;
                    }
                }
                None => self.dependencies.push(item),
            }
        }
        self
    }

    pub fn all_defined(&self) -> bool {
        self.dependencies.iter().all(Option::is_some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;

    fn keys(manager: &DependencyManager) -> Vec<Option<String>> {
        manager
            .dependencies()
            .iter()
            .map(|d| d.as_ref().and_then(|d| d.key()).map(|k| k.to_string()))
            .collect()
    }

    fn model(name: &str) -> Option<DependencyModel> {
        Some(DependencyModel::new(Key::named(name)))
    }

    #[test]
    fn merge_fills_holes_and_extends() {
        let mut manager = DependencyManager::new(vec![model("A"), None, model("C")]);
        manager.merge(vec![model("X"), model("Y")]);
        assert_eq!(
            keys(&manager),
            vec![Some("A".into()), Some("Y".into()), Some("C".into())]
        );

        manager.merge(vec![None, None, None, model("D")]);
        assert_eq!(manager.len(), 4);
        assert_eq!(manager.get_index(3).and_then(|d| d.key()), Some(&Key::named("D")));
    }

    #[test]
    fn set_index_grows_with_holes() {
        let mut manager = DependencyManager::default();
        manager.set_index(2, Some(Key::named("Z").into()));
        assert_eq!(keys(&manager), vec![None, None, Some("Z".into())]);
        assert!(!manager.all_defined());
    }

    #[test]
    fn insert_index_shifts_entries() {
        let mut manager = DependencyManager::default();
        manager.push(Key::named("A")).push(Key::named("C"));
        manager.insert_index(1, Some(Key::named("B").into()));
        assert_eq!(
            keys(&manager),
            vec![Some("A".into()), Some("B".into()), Some("C".into())]
        );
        assert!(manager.all_defined());
    }
}
